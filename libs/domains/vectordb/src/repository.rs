use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{VectorDbError, VectorDbResult};
use crate::models::{Collection, Entity, EntityId};

/// Storage for collections and their entities.
///
/// Entities are keyed by `(collection id, entity id)`; collections by
/// `(tenant, name)`. Fetching a collection never loads its entities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
    // ===== Collections =====

    /// `Conflict` if the tenant already has a collection with that name
    async fn insert_collection(&self, collection: Collection) -> VectorDbResult<Collection>;

    async fn get_collection(&self, tenant: &str, name: &str) -> VectorDbResult<Option<Collection>>;

    /// Ordered by name ascending
    async fn list_collections(&self, tenant: &str) -> VectorDbResult<Vec<Collection>>;

    /// Deletes the collection and all its entities; returns whether it existed
    async fn delete_collection(&self, collection_id: Uuid) -> VectorDbResult<bool>;

    /// Deletes every collection of `tenant`; returns how many were removed
    async fn purge_tenant(&self, tenant: &str) -> VectorDbResult<u64>;

    // ===== Entities =====

    /// All-or-nothing upsert of `entities`.
    ///
    /// `last_assigned_id` raises the collection's id sequence in the same
    /// write; the sequence never moves backwards.
    async fn put_entities(
        &self,
        collection_id: Uuid,
        entities: Vec<Entity>,
        last_assigned_id: Option<EntityId>,
    ) -> VectorDbResult<()>;

    /// Found entities, id ascending; unknown ids are skipped
    async fn get_entities(
        &self,
        collection_id: Uuid,
        ids: Vec<EntityId>,
    ) -> VectorDbResult<Vec<Entity>>;

    /// Every entity of the collection, id ascending
    async fn scan_entities(&self, collection_id: Uuid) -> VectorDbResult<Vec<Entity>>;

    /// Returns how many entities were removed
    async fn delete_entities(&self, collection_id: Uuid, ids: Vec<EntityId>)
    -> VectorDbResult<u64>;

    /// Last id handed out by automatic assignment, 0 before the first one.
    /// Deleting entities does not lower it.
    async fn entity_id_sequence(&self, collection_id: Uuid) -> VectorDbResult<EntityId>;

    async fn count_entities(&self, collection_id: Uuid) -> VectorDbResult<u64>;
}

#[derive(Default)]
struct State {
    /// (tenant, name) -> collection
    collections: BTreeMap<(String, String), Collection>,
    /// collection id -> entity id -> entity
    entities: HashMap<Uuid, BTreeMap<EntityId, Entity>>,
    /// collection id -> last automatically assigned entity id
    id_sequences: HashMap<Uuid, EntityId>,
}

/// In-memory store.
///
/// Every write happens under one lock with no await while it is held, so a
/// dropped request can never leave half a batch behind.
#[derive(Clone, Default)]
pub struct InMemoryVectorStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_collection(collection_id: Uuid) -> VectorDbError {
    VectorDbError::NotFound(format!("collection {} no longer exists", collection_id))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert_collection(&self, collection: Collection) -> VectorDbResult<Collection> {
        let mut state = self.state.write().await;
        let key = (collection.tenant.clone(), collection.name.clone());
        if state.collections.contains_key(&key) {
            return Err(VectorDbError::Conflict(format!(
                "collection '{}' already exists",
                collection.name
            )));
        }

        state.entities.insert(collection.id, BTreeMap::new());
        state.id_sequences.insert(collection.id, 0);
        state.collections.insert(key, collection.clone());
        Ok(collection)
    }

    async fn get_collection(&self, tenant: &str, name: &str) -> VectorDbResult<Option<Collection>> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(&(tenant.to_string(), name.to_string()))
            .cloned())
    }

    async fn list_collections(&self, tenant: &str) -> VectorDbResult<Vec<Collection>> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .values()
            .filter(|c| c.tenant == tenant)
            .cloned()
            .collect())
    }

    async fn delete_collection(&self, collection_id: Uuid) -> VectorDbResult<bool> {
        let mut state = self.state.write().await;
        let before = state.collections.len();
        state.collections.retain(|_, c| c.id != collection_id);
        state.entities.remove(&collection_id);
        state.id_sequences.remove(&collection_id);
        Ok(state.collections.len() < before)
    }

    async fn purge_tenant(&self, tenant: &str) -> VectorDbResult<u64> {
        let mut state = self.state.write().await;
        let ids: Vec<Uuid> = state
            .collections
            .values()
            .filter(|c| c.tenant == tenant)
            .map(|c| c.id)
            .collect();

        state.collections.retain(|_, c| c.tenant != tenant);
        for id in &ids {
            state.entities.remove(id);
            state.id_sequences.remove(id);
        }
        Ok(ids.len() as u64)
    }

    async fn put_entities(
        &self,
        collection_id: Uuid,
        entities: Vec<Entity>,
        last_assigned_id: Option<EntityId>,
    ) -> VectorDbResult<()> {
        let mut state = self.state.write().await;
        let State {
            entities: stored,
            id_sequences,
            ..
        } = &mut *state;
        let stored = stored
            .get_mut(&collection_id)
            .ok_or_else(|| missing_collection(collection_id))?;

        for entity in entities {
            stored.insert(entity.id, entity);
        }
        if let Some(id) = last_assigned_id {
            let sequence = id_sequences.entry(collection_id).or_default();
            *sequence = (*sequence).max(id);
        }
        Ok(())
    }

    async fn get_entities(
        &self,
        collection_id: Uuid,
        ids: Vec<EntityId>,
    ) -> VectorDbResult<Vec<Entity>> {
        let state = self.state.read().await;
        let Some(stored) = state.entities.get(&collection_id) else {
            return Ok(Vec::new());
        };

        let mut found: Vec<Entity> = ids.iter().filter_map(|id| stored.get(id)).cloned().collect();
        found.sort_by_key(|e| e.id);
        found.dedup_by_key(|e| e.id);
        Ok(found)
    }

    async fn scan_entities(&self, collection_id: Uuid) -> VectorDbResult<Vec<Entity>> {
        let state = self.state.read().await;
        Ok(state
            .entities
            .get(&collection_id)
            .map(|stored| stored.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_entities(
        &self,
        collection_id: Uuid,
        ids: Vec<EntityId>,
    ) -> VectorDbResult<u64> {
        let mut state = self.state.write().await;
        let Some(stored) = state.entities.get_mut(&collection_id) else {
            return Ok(0);
        };

        Ok(ids.iter().filter(|id| stored.remove(id).is_some()).count() as u64)
    }

    async fn entity_id_sequence(&self, collection_id: Uuid) -> VectorDbResult<EntityId> {
        let state = self.state.read().await;
        state
            .id_sequences
            .get(&collection_id)
            .copied()
            .ok_or_else(|| missing_collection(collection_id))
    }

    async fn count_entities(&self, collection_id: Uuid) -> VectorDbResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .entities
            .get(&collection_id)
            .map(|stored| stored.len() as u64)
            .unwrap_or(0))
    }
}
