use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{VectorDbError, VectorDbResult};
use crate::locks::CollectionLocks;
use crate::models::{
    Collection, CollectionDescription, DEFAULT_VECTOR_FIELD, DistanceMetric, NewCollection,
    TenantContext, validate_name,
};
use crate::repository::VectorStore;
use crate::timeout::bounded;

/// Tenant-scoped catalog of collections.
///
/// Every lookup is keyed by the caller's namespace, so another tenant's
/// collection with the same name is simply absent.
pub struct CollectionRegistry<S: VectorStore> {
    store: Arc<S>,
    locks: CollectionLocks,
    timeout: Duration,
    max_dimension: usize,
    default_metric: DistanceMetric,
}

impl<S: VectorStore> Clone for CollectionRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            locks: self.locks.clone(),
            timeout: self.timeout,
            max_dimension: self.max_dimension,
            default_metric: self.default_metric,
        }
    }
}

impl<S: VectorStore> CollectionRegistry<S> {
    pub fn new(
        store: Arc<S>,
        locks: CollectionLocks,
        timeout: Duration,
        max_dimension: usize,
        default_metric: DistanceMetric,
    ) -> Self {
        Self {
            store,
            locks,
            timeout,
            max_dimension,
            default_metric,
        }
    }

    pub async fn create(
        &self,
        ctx: &TenantContext,
        input: NewCollection,
    ) -> VectorDbResult<Collection> {
        validate_name("collection", &input.name)?;
        if input.dimension <= 0 {
            return Err(VectorDbError::InvalidArgument(format!(
                "dimension must be positive, got {}",
                input.dimension
            )));
        }
        if input.dimension as u64 > self.max_dimension as u64 {
            return Err(VectorDbError::InvalidArgument(format!(
                "dimension {} exceeds the maximum of {}",
                input.dimension, self.max_dimension
            )));
        }

        let vector_field = input
            .vector_field
            .unwrap_or_else(|| DEFAULT_VECTOR_FIELD.to_string());
        validate_name("vector field", &vector_field)?;

        let collection = Collection {
            id: Uuid::now_v7(),
            tenant: ctx.namespace().to_string(),
            name: input.name,
            dimension: input.dimension as usize,
            metric: input.metric.unwrap_or(self.default_metric),
            vector_field,
            fields: input.fields,
            created_at: Utc::now(),
        };

        let collection = bounded(
            self.timeout,
            "create collection",
            self.store.insert_collection(collection),
        )
        .await?;

        tracing::info!(
            tenant = %collection.tenant,
            collection = %collection.name,
            dimension = collection.dimension,
            metric = %collection.metric,
            "Created collection"
        );
        Ok(collection)
    }

    pub async fn get(&self, ctx: &TenantContext, name: &str) -> VectorDbResult<Collection> {
        bounded(
            self.timeout,
            "get collection",
            self.store.get_collection(ctx.namespace(), name),
        )
        .await?
        .ok_or_else(|| VectorDbError::collection_not_found(name))
    }

    /// Ordered by name ascending
    pub async fn list(&self, ctx: &TenantContext) -> VectorDbResult<Vec<Collection>> {
        bounded(
            self.timeout,
            "list collections",
            self.store.list_collections(ctx.namespace()),
        )
        .await
    }

    /// Collection plus its entity count, as two separate store calls
    pub async fn describe(
        &self,
        ctx: &TenantContext,
        name: &str,
    ) -> VectorDbResult<CollectionDescription> {
        let collection = self.get(ctx, name).await?;
        let entity_count = bounded(
            self.timeout,
            "count entities",
            self.store.count_entities(collection.id),
        )
        .await?;

        Ok(CollectionDescription {
            collection,
            entity_count,
        })
    }

    pub async fn drop(&self, ctx: &TenantContext, name: &str) -> VectorDbResult<()> {
        let collection = self.get(ctx, name).await?;
        let _guard = self.locks.acquire(collection.id).await;

        let removed = bounded(
            self.timeout,
            "drop collection",
            self.store.delete_collection(collection.id),
        )
        .await?;
        self.locks.forget(collection.id);

        if !removed {
            return Err(VectorDbError::collection_not_found(name));
        }

        tracing::info!(
            tenant = %ctx.namespace(),
            collection = %name,
            "Dropped collection"
        );
        Ok(())
    }

    /// Resolve `name` and lock it for a mutation.
    ///
    /// The collection is looked up again once the lock is held, so a writer
    /// that queued behind a drop gets `NotFound` instead of writing into a
    /// collection that no longer exists.
    pub(crate) async fn lock_for_write(
        &self,
        ctx: &TenantContext,
        name: &str,
    ) -> VectorDbResult<(Collection, tokio::sync::OwnedMutexGuard<()>)> {
        let collection = self.get(ctx, name).await?;
        let guard = self.locks.acquire(collection.id).await;

        match self.get(ctx, name).await {
            Ok(current) if current.id == collection.id => Ok((current, guard)),
            Ok(_) | Err(VectorDbError::NotFound(_)) => {
                Err(VectorDbError::collection_not_found(name))
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }
}
