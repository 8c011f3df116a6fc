use std::collections::HashSet;

use crate::error::{VectorDbError, VectorDbResult};
use crate::models::{
    Collection, Entity, EntityId, EntityRecord, InsertResult, Metadata, NewEntity, TenantContext,
};
use crate::registry::CollectionRegistry;
use crate::repository::VectorStore;
use crate::search::project;
use crate::timeout::bounded;

/// Metadata keys hidden behind the entity's own `id` and `vector`
const RECORD_RESERVED: [&str; 2] = ["id", "vector"];

/// Tenant- and collection-scoped entity writes and point reads.
///
/// Writes hold the collection's lock from validation to commit, so id
/// assignment and the dimension check see the same collection state as the
/// write itself.
pub struct EntityStore<S: VectorStore> {
    registry: CollectionRegistry<S>,
}

impl<S: VectorStore> Clone for EntityStore<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<S: VectorStore> EntityStore<S> {
    pub fn new(registry: CollectionRegistry<S>) -> Self {
        Self { registry }
    }

    pub async fn insert(
        &self,
        ctx: &TenantContext,
        collection_name: &str,
        batch: Vec<NewEntity>,
    ) -> VectorDbResult<InsertResult> {
        if batch.is_empty() {
            return Err(VectorDbError::InvalidArgument(
                "insert requires at least one entity".to_string(),
            ));
        }

        let (collection, _guard) = self.registry.lock_for_write(ctx, collection_name).await?;
        check_batch(&collection, &batch)?;

        let store = self.registry.store();
        let timeout = self.registry.timeout();
        let wanted = batch.iter().filter(|e| e.id.is_none()).count();
        let fresh = if wanted == 0 {
            Vec::new()
        } else {
            let explicit: HashSet<EntityId> = batch.iter().filter_map(|e| e.id).collect();
            self.allocate_ids(&collection, wanted, &explicit).await?
        };
        let last_assigned = fresh.last().copied();
        let entities = assign_ids(batch, fresh);
        let insert_ids: Vec<EntityId> = entities.iter().map(|e| e.id).collect();

        bounded(
            timeout,
            "insert entities",
            store.put_entities(collection.id, entities, last_assigned),
        )
        .await?;

        tracing::info!(
            tenant = %ctx.namespace(),
            collection = %collection.name,
            count = insert_ids.len(),
            "Inserted entities"
        );
        Ok(InsertResult {
            insert_count: insert_ids.len(),
            insert_ids,
        })
    }

    /// Next `count` ids after the collection's sequence, skipping ids that are
    /// stored already or explicit in the current batch. Must run under the
    /// collection's write lock.
    async fn allocate_ids(
        &self,
        collection: &Collection,
        count: usize,
        explicit: &HashSet<EntityId>,
    ) -> VectorDbResult<Vec<EntityId>> {
        let store = self.registry.store();
        let timeout = self.registry.timeout();
        let mut last = bounded(
            timeout,
            "entity id sequence",
            store.entity_id_sequence(collection.id),
        )
        .await?;

        let mut ids = Vec::with_capacity(count);
        while ids.len() < count {
            let mut candidates = Vec::with_capacity(count - ids.len());
            while candidates.len() < count - ids.len() {
                last = last.checked_add(1).ok_or_else(|| {
                    VectorDbError::InvalidArgument("entity id space exhausted".to_string())
                })?;
                if !explicit.contains(&last) {
                    candidates.push(last);
                }
            }

            let taken: HashSet<EntityId> = bounded(
                timeout,
                "get entities",
                store.get_entities(collection.id, candidates.clone()),
            )
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();
            ids.extend(candidates.into_iter().filter(|id| !taken.contains(id)));
        }
        Ok(ids)
    }

    /// `output_fields` of `None` returns all metadata
    pub async fn get(
        &self,
        ctx: &TenantContext,
        collection_name: &str,
        ids: Vec<EntityId>,
        output_fields: Option<Vec<String>>,
    ) -> VectorDbResult<Vec<EntityRecord>> {
        let collection = self.registry.get(ctx, collection_name).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let entities = bounded(
            self.registry.timeout(),
            "get entities",
            self.registry.store().get_entities(collection.id, ids),
        )
        .await?;

        Ok(entities
            .into_iter()
            .map(|entity| {
                let fields = match &output_fields {
                    Some(names) => project(&entity.metadata, names, &RECORD_RESERVED),
                    None => entity
                        .metadata
                        .into_iter()
                        .filter(|(key, _)| !RECORD_RESERVED.contains(&key.as_str()))
                        .collect(),
                };
                EntityRecord {
                    id: entity.id,
                    vector: entity.vector,
                    fields,
                }
            })
            .collect())
    }

    /// Unknown ids are skipped; returns how many entities were removed
    pub async fn delete(
        &self,
        ctx: &TenantContext,
        collection_name: &str,
        ids: Vec<EntityId>,
    ) -> VectorDbResult<u64> {
        let (collection, _guard) = self.registry.lock_for_write(ctx, collection_name).await?;
        if ids.is_empty() {
            return Ok(0);
        }

        let removed = bounded(
            self.registry.timeout(),
            "delete entities",
            self.registry.store().delete_entities(collection.id, ids),
        )
        .await?;

        tracing::info!(
            tenant = %ctx.namespace(),
            collection = %collection.name,
            count = removed,
            "Deleted entities"
        );
        Ok(removed)
    }
}

/// Rejects the whole batch on the first bad entity
fn check_batch(collection: &Collection, batch: &[NewEntity]) -> VectorDbResult<()> {
    let mut seen = HashSet::new();
    for entity in batch {
        if entity.vector.len() != collection.dimension {
            return Err(VectorDbError::DimensionMismatch {
                expected: collection.dimension,
                actual: entity.vector.len(),
            });
        }
        if entity.vector.iter().any(|x| !x.is_finite()) {
            return Err(VectorDbError::InvalidArgument(
                "vector components must be finite".to_string(),
            ));
        }
        match &entity.metadata {
            None | Some(serde_json::Value::Null) | Some(serde_json::Value::Object(_)) => {}
            Some(_) => {
                return Err(VectorDbError::InvalidArgument(
                    "entity metadata must be a JSON object".to_string(),
                ));
            }
        }
        match entity.id {
            Some(id) if !seen.insert(id) => {
                return Err(VectorDbError::InvalidArgument(format!(
                    "id {} appears more than once in the batch",
                    id
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Hands `fresh` ids, in order, to the entities that arrived without one
fn assign_ids(batch: Vec<NewEntity>, fresh: Vec<EntityId>) -> Vec<Entity> {
    let mut fresh = fresh.into_iter();
    batch
        .into_iter()
        .filter_map(|entity| {
            let id = entity.id.or_else(|| fresh.next())?;
            let metadata = match entity.metadata {
                Some(serde_json::Value::Object(map)) => map,
                _ => Metadata::new(),
            };
            Some(Entity {
                id,
                vector: entity.vector,
                metadata,
            })
        })
        .collect()
}
