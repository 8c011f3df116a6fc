use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use super::schema::{collections, entities};
use crate::error::{VectorDbError, VectorDbResult};
use crate::models::{Collection, Entity, EntityId};
use crate::repository::VectorStore;

/// Rows per INSERT statement; keeps bind parameters well under the protocol limit
const UPSERT_CHUNK: usize = 1000;

/// PostgreSQL implementation of [`VectorStore`].
///
/// Entity vectors are stored as little-endian `f32` bytes. Deleting a
/// collection row cascades to its entities through the foreign key.
#[derive(Clone)]
pub struct PgVectorStore {
    db: DatabaseConnection,
}

impl PgVectorStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn decode_all(models: Vec<entities::Model>) -> VectorDbResult<Vec<Entity>> {
    models.into_iter().map(Entity::try_from).collect()
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn insert_collection(&self, collection: Collection) -> VectorDbResult<Collection> {
        let active_model = collections::ActiveModel::try_from(&collection)?;
        active_model
            .insert(&self.db)
            .await
            .map_err(|e| match VectorDbError::from(e) {
                VectorDbError::Conflict(_) => VectorDbError::Conflict(format!(
                    "collection '{}' already exists",
                    collection.name
                )),
                other => other,
            })?;

        tracing::debug!(collection_id = %collection.id, "Inserted collection row");
        Ok(collection)
    }

    async fn get_collection(&self, tenant: &str, name: &str) -> VectorDbResult<Option<Collection>> {
        collections::Entity::find()
            .filter(collections::Column::Tenant.eq(tenant))
            .filter(collections::Column::Name.eq(name))
            .one(&self.db)
            .await?
            .map(Collection::try_from)
            .transpose()
    }

    async fn list_collections(&self, tenant: &str) -> VectorDbResult<Vec<Collection>> {
        collections::Entity::find()
            .filter(collections::Column::Tenant.eq(tenant))
            .order_by_asc(collections::Column::Name)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Collection::try_from)
            .collect()
    }

    async fn delete_collection(&self, collection_id: Uuid) -> VectorDbResult<bool> {
        let result = collections::Entity::delete_by_id(collection_id)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn purge_tenant(&self, tenant: &str) -> VectorDbResult<u64> {
        let result = collections::Entity::delete_many()
            .filter(collections::Column::Tenant.eq(tenant))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn put_entities(
        &self,
        collection_id: Uuid,
        batch: Vec<Entity>,
        last_assigned_id: Option<EntityId>,
    ) -> VectorDbResult<()> {
        let total = batch.len();
        let mut rows: Vec<entities::ActiveModel> = batch
            .into_iter()
            .map(|entity| entities::active_model(collection_id, entity))
            .collect();

        let txn = self.db.begin().await?;
        while !rows.is_empty() {
            let rest = rows.split_off(rows.len().min(UPSERT_CHUNK));
            entities::Entity::insert_many(std::mem::replace(&mut rows, rest))
                .on_conflict(
                    OnConflict::columns([
                        entities::Column::CollectionId,
                        entities::Column::EntityId,
                    ])
                    .update_columns([entities::Column::Vector, entities::Column::Metadata])
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        if let Some(id) = last_assigned_id {
            collections::Entity::update_many()
                .col_expr(collections::Column::LastEntityId, Expr::value(id))
                .filter(collections::Column::Id.eq(collection_id))
                .filter(collections::Column::LastEntityId.lt(id))
                .exec(&txn)
                .await?;
        }
        // Dropping `txn` before this point rolls the whole batch back
        txn.commit().await?;

        tracing::debug!(collection_id = %collection_id, count = total, "Upserted entity rows");
        Ok(())
    }

    async fn get_entities(
        &self,
        collection_id: Uuid,
        ids: Vec<EntityId>,
    ) -> VectorDbResult<Vec<Entity>> {
        let models = entities::Entity::find()
            .filter(entities::Column::CollectionId.eq(collection_id))
            .filter(entities::Column::EntityId.is_in(ids))
            .order_by_asc(entities::Column::EntityId)
            .all(&self.db)
            .await?;
        decode_all(models)
    }

    async fn scan_entities(&self, collection_id: Uuid) -> VectorDbResult<Vec<Entity>> {
        let models = entities::Entity::find()
            .filter(entities::Column::CollectionId.eq(collection_id))
            .order_by_asc(entities::Column::EntityId)
            .all(&self.db)
            .await?;
        decode_all(models)
    }

    async fn delete_entities(
        &self,
        collection_id: Uuid,
        ids: Vec<EntityId>,
    ) -> VectorDbResult<u64> {
        let result = entities::Entity::delete_many()
            .filter(entities::Column::CollectionId.eq(collection_id))
            .filter(entities::Column::EntityId.is_in(ids))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn entity_id_sequence(&self, collection_id: Uuid) -> VectorDbResult<EntityId> {
        let sequence: Option<i64> = collections::Entity::find_by_id(collection_id)
            .select_only()
            .column(collections::Column::LastEntityId)
            .into_tuple()
            .one(&self.db)
            .await?;
        sequence.ok_or_else(|| {
            VectorDbError::NotFound(format!("collection {} no longer exists", collection_id))
        })
    }

    async fn count_entities(&self, collection_id: Uuid) -> VectorDbResult<u64> {
        let count = entities::Entity::find()
            .filter(entities::Column::CollectionId.eq(collection_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}
