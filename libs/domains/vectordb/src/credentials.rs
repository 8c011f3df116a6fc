use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{VectorDbError, VectorDbResult};
use crate::models::TenantRecord;

/// Tenant identity -> credential hash lookup, plus tenant administration
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a new tenant; `Conflict` if the name is taken
    async fn create(&self, tenant: TenantRecord) -> VectorDbResult<()>;

    async fn find(&self, name: &str) -> VectorDbResult<Option<TenantRecord>>;

    /// All tenant names, ascending
    async fn list(&self) -> VectorDbResult<Vec<String>>;

    /// Returns whether the tenant existed
    async fn delete(&self, name: &str) -> VectorDbResult<bool>;
}

/// In-memory credential store
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    tenants: Arc<RwLock<BTreeMap<String, TenantRecord>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create(&self, tenant: TenantRecord) -> VectorDbResult<()> {
        let mut tenants = self.tenants.write().await;
        if tenants.contains_key(&tenant.name) {
            return Err(VectorDbError::Conflict(format!(
                "user '{}' already exists",
                tenant.name
            )));
        }

        tracing::info!(tenant = %tenant.name, "Stored tenant credentials");
        tenants.insert(tenant.name.clone(), tenant);
        Ok(())
    }

    async fn find(&self, name: &str) -> VectorDbResult<Option<TenantRecord>> {
        let tenants = self.tenants.read().await;
        Ok(tenants.get(name).cloned())
    }

    async fn list(&self) -> VectorDbResult<Vec<String>> {
        let tenants = self.tenants.read().await;
        Ok(tenants.keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> VectorDbResult<bool> {
        let mut tenants = self.tenants.write().await;
        let removed = tenants.remove(name).is_some();
        if removed {
            tracing::info!(tenant = %name, "Removed tenant credentials");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(name: &str) -> TenantRecord {
        TenantRecord {
            name: name.to_string(),
            secret_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            pub_key: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_find_list_delete() {
        let store = InMemoryCredentialStore::new();
        store.create(record("bob")).await.unwrap();
        store.create(record("alice")).await.unwrap();

        assert_eq!(store.find("alice").await.unwrap().unwrap().name, "alice");
        assert!(store.find("carol").await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap(), vec!["alice", "bob"]);

        assert!(store.delete("alice").await.unwrap());
        assert!(!store.delete("alice").await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec!["bob"]);
    }

    #[tokio::test]
    async fn test_duplicate_is_conflict() {
        let store = InMemoryCredentialStore::new();
        store.create(record("alice")).await.unwrap();

        let err = store.create(record("alice")).await.unwrap_err();
        assert!(matches!(err, VectorDbError::Conflict(_)));
    }
}
