use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthGate, SecretHasher};
use crate::config::VectorDbConfig;
use crate::credentials::CredentialStore;
use crate::entities::EntityStore;
use crate::error::{VectorDbError, VectorDbResult};
use crate::locks::CollectionLocks;
use crate::models::{
    Collection, CollectionDescription, EntityId, EntityRecord, InsertResult, NewCollection,
    NewEntity, NewTenant, SearchHit, SearchQuery, TenantContext,
};
use crate::registry::CollectionRegistry;
use crate::repository::VectorStore;
use crate::search::SearchEngine;
use crate::timeout::bounded;

/// Composition root: every operation of the service, scoped by a [`TenantContext`].
///
/// Holds no process-wide state; tests build as many instances as they need.
pub struct VectorDbService<C: CredentialStore, S: VectorStore> {
    auth: AuthGate<C>,
    store: Arc<S>,
    registry: CollectionRegistry<S>,
    entities: EntityStore<S>,
    search: SearchEngine<S>,
    timeout: Duration,
}

impl<C: CredentialStore, S: VectorStore> VectorDbService<C, S> {
    pub fn new(credentials: C, store: S, config: &VectorDbConfig) -> VectorDbResult<Self> {
        Self::with_hasher(credentials, store, config, SecretHasher::default())
    }

    pub fn with_hasher(
        credentials: C,
        store: S,
        config: &VectorDbConfig,
        hasher: SecretHasher,
    ) -> VectorDbResult<Self> {
        let store = Arc::new(store);
        let auth = AuthGate::new(
            Arc::new(credentials),
            hasher,
            config.root_user.clone(),
            &config.root_password,
            config.store_timeout,
        )?;
        let registry = CollectionRegistry::new(
            store.clone(),
            CollectionLocks::new(),
            config.store_timeout,
            config.max_dimension,
            config.default_metric,
        );

        Ok(Self {
            auth,
            entities: EntityStore::new(registry.clone()),
            search: SearchEngine::new(registry.clone(), config.max_search_limit),
            registry,
            store,
            timeout: config.store_timeout,
        })
    }

    // ===== Authentication =====

    /// Bearer token `identity:secret` to a request context
    pub async fn authenticate(&self, token: &str) -> VectorDbResult<TenantContext> {
        self.auth.authenticate(token).await
    }

    fn require_root(ctx: &TenantContext) -> VectorDbResult<()> {
        if ctx.is_root() {
            Ok(())
        } else {
            Err(VectorDbError::Forbidden(
                "only the root user may administer users".to_string(),
            ))
        }
    }

    // ===== Users (root only) =====

    pub async fn create_user(&self, ctx: &TenantContext, input: NewTenant) -> VectorDbResult<()> {
        Self::require_root(ctx)?;
        let name = input.name.clone();
        self.auth.create_tenant(input).await?;

        tracing::info!(tenant = %name, "Created user");
        Ok(())
    }

    /// Identities in ascending order
    pub async fn list_users(&self, ctx: &TenantContext) -> VectorDbResult<Vec<String>> {
        Self::require_root(ctx)?;
        self.auth.list_tenants().await
    }

    /// Removes every collection the user owns, then the user.
    ///
    /// Credentials go last: if the purge fails the user still exists and the
    /// drop can be retried.
    pub async fn drop_user(&self, ctx: &TenantContext, name: &str) -> VectorDbResult<()> {
        Self::require_root(ctx)?;
        self.auth.require_tenant(name).await?;
        let purged = bounded(self.timeout, "purge tenant", self.store.purge_tenant(name)).await?;
        self.auth.drop_tenant(name).await?;

        tracing::info!(tenant = %name, collections = purged, "Dropped user");
        Ok(())
    }

    // ===== Collections =====

    pub async fn create_collection(
        &self,
        ctx: &TenantContext,
        input: NewCollection,
    ) -> VectorDbResult<Collection> {
        self.registry.create(ctx, input).await
    }

    pub async fn list_collections(&self, ctx: &TenantContext) -> VectorDbResult<Vec<Collection>> {
        self.registry.list(ctx).await
    }

    pub async fn describe_collection(
        &self,
        ctx: &TenantContext,
        name: &str,
    ) -> VectorDbResult<CollectionDescription> {
        self.registry.describe(ctx, name).await
    }

    pub async fn drop_collection(&self, ctx: &TenantContext, name: &str) -> VectorDbResult<()> {
        self.registry.drop(ctx, name).await
    }

    // ===== Entities =====

    pub async fn insert(
        &self,
        ctx: &TenantContext,
        collection_name: &str,
        batch: Vec<NewEntity>,
    ) -> VectorDbResult<InsertResult> {
        self.entities.insert(ctx, collection_name, batch).await
    }

    pub async fn get_entities(
        &self,
        ctx: &TenantContext,
        collection_name: &str,
        ids: Vec<EntityId>,
        output_fields: Option<Vec<String>>,
    ) -> VectorDbResult<Vec<EntityRecord>> {
        self.entities
            .get(ctx, collection_name, ids, output_fields)
            .await
    }

    pub async fn delete_entities(
        &self,
        ctx: &TenantContext,
        collection_name: &str,
        ids: Vec<EntityId>,
    ) -> VectorDbResult<u64> {
        self.entities.delete(ctx, collection_name, ids).await
    }

    pub async fn search(
        &self,
        ctx: &TenantContext,
        query: SearchQuery,
    ) -> VectorDbResult<Vec<Vec<SearchHit>>> {
        self.search.search(ctx, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::InMemoryCredentialStore;
    use crate::repository::{InMemoryVectorStore, MockVectorStore};

    type TestService = VectorDbService<InMemoryCredentialStore, InMemoryVectorStore>;

    fn service() -> TestService {
        VectorDbService::with_hasher(
            InMemoryCredentialStore::new(),
            InMemoryVectorStore::new(),
            &VectorDbConfig::new("root", "Orenco"),
            SecretHasher::insecure_fast(),
        )
        .unwrap()
    }

    fn user(name: &str) -> NewTenant {
        NewTenant {
            name: name.to_string(),
            secret: "p".to_string(),
            pub_key: None,
        }
    }

    fn collection(name: &str) -> NewCollection {
        NewCollection {
            name: name.to_string(),
            dimension: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_user_admin_requires_root() {
        let svc = service();
        let root = svc.authenticate("root:Orenco").await.unwrap();
        svc.create_user(&root, user("t1")).await.unwrap();

        let t1 = svc.authenticate("t1:p").await.unwrap();
        let cases = [
            svc.create_user(&t1, user("t2")).await,
            svc.drop_user(&t1, "t1").await,
            svc.list_users(&t1).await.map(|_| ()),
        ];
        for result in cases {
            assert!(matches!(result, Err(VectorDbError::Forbidden(_))));
        }

        assert_eq!(svc.list_users(&root).await.unwrap(), vec!["t1"]);
    }

    #[tokio::test]
    async fn test_drop_user_cascades_to_collections() {
        let svc = service();
        let root = svc.authenticate("root:Orenco").await.unwrap();
        svc.create_user(&root, user("t1")).await.unwrap();

        let t1 = svc.authenticate("t1:p").await.unwrap();
        svc.create_collection(&t1, collection("docs")).await.unwrap();
        svc.insert(
            &t1,
            "docs",
            vec![NewEntity {
                vector: vec![0.0, 1.0],
                ..Default::default()
            }],
        )
        .await
        .unwrap();

        svc.drop_user(&root, "t1").await.unwrap();
        assert!(matches!(
            svc.authenticate("t1:p").await,
            Err(VectorDbError::Unauthorized(_))
        ));

        // A new user of the same name starts empty
        svc.create_user(&root, user("t1")).await.unwrap();
        let t1 = svc.authenticate("t1:p").await.unwrap();
        assert!(svc.list_collections(&t1).await.unwrap().is_empty());

        let err = svc.drop_user(&root, "t1-missing").await.unwrap_err();
        assert!(matches!(err, VectorDbError::NotFound(ref msg) if msg == "User not found"));
    }

    #[tokio::test]
    async fn test_root_has_its_own_namespace() {
        let svc = service();
        let root = svc.authenticate("root:Orenco").await.unwrap();
        svc.create_user(&root, user("t1")).await.unwrap();
        let t1 = svc.authenticate("t1:p").await.unwrap();

        svc.create_collection(&root, collection("docs")).await.unwrap();
        assert!(svc.list_collections(&t1).await.unwrap().is_empty());
        svc.create_collection(&t1, collection("docs")).await.unwrap();
        assert_eq!(svc.list_collections(&root).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_collection_then_insert_and_search_fail() {
        let svc = service();
        let ctx = svc.authenticate("root:Orenco").await.unwrap();
        svc.create_collection(&ctx, collection("docs")).await.unwrap();
        svc.drop_collection(&ctx, "docs").await.unwrap();

        let insert = svc
            .insert(
                &ctx,
                "docs",
                vec![NewEntity {
                    vector: vec![0.0, 0.0],
                    ..Default::default()
                }],
            )
            .await;
        assert!(matches!(insert, Err(VectorDbError::NotFound(_))));

        let search = svc
            .search(
                &ctx,
                SearchQuery {
                    collection_name: "docs".into(),
                    vectors: vec![vec![0.0, 0.0]],
                    limit: 1,
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(search, Err(VectorDbError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_distinct_ids() {
        let svc = Arc::new(service());
        let ctx = svc.authenticate("root:Orenco").await.unwrap();
        svc.create_collection(&ctx, collection("docs")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                svc.insert(
                    &ctx,
                    "docs",
                    vec![
                        NewEntity {
                            vector: vec![0.0, 0.0],
                            ..Default::default()
                        };
                        4
                    ],
                )
                .await
                .unwrap()
                .insert_ids
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.extend(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=32).collect::<Vec<_>>());
    }

    fn service_over(
        store: MockVectorStore,
    ) -> VectorDbService<InMemoryCredentialStore, MockVectorStore> {
        VectorDbService::with_hasher(
            InMemoryCredentialStore::new(),
            store,
            &VectorDbConfig::new("root", "Orenco"),
            SecretHasher::insecure_fast(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_failed_purge_keeps_the_user() {
        let mut store = MockVectorStore::new();
        store
            .expect_purge_tenant()
            .times(2)
            .returning(|_| Err(VectorDbError::Timeout("purge tenant".into())));

        // Creating a user never touches collection storage
        let svc = service_over(store);
        let root = TenantContext::root("root");
        svc.create_user(&root, user("t1")).await.unwrap();

        let err = svc.drop_user(&root, "t1").await.unwrap_err();
        assert!(matches!(err, VectorDbError::Timeout(_)));

        // Still fully present, so the drop can simply be retried
        svc.authenticate("t1:p").await.unwrap();
        assert_eq!(svc.list_users(&root).await.unwrap(), vec!["t1"]);
        let retry = svc.drop_user(&root, "t1").await.unwrap_err();
        assert!(matches!(retry, VectorDbError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_drop_missing_user_purges_nothing() {
        let mut store = MockVectorStore::new();
        store.expect_purge_tenant().never();

        let svc = service_over(store);
        let err = svc
            .drop_user(&TenantContext::root("root"), "ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, VectorDbError::NotFound(ref msg) if msg == "User not found"));
    }
}
