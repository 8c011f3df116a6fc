use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{VectorDbError, VectorDbResult};
use crate::models::{
    Collection, DistanceMetric, Entity, EntityId, Metadata, SearchHit, SearchQuery, TenantContext,
};
use crate::registry::CollectionRegistry;
use crate::repository::VectorStore;
use crate::timeout::bounded;

/// Metadata keys hidden behind a hit's own `id` and `distance`
const HIT_RESERVED: [&str; 2] = ["id", "distance"];

// ===== Scoring =====

/// Squared Euclidean distance, accumulated in f64
pub fn squared_l2(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum()
}

/// Cosine similarity in [-1, 1]; 0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

pub fn score(metric: DistanceMetric, query: &[f32], vector: &[f32]) -> f64 {
    match metric {
        DistanceMetric::L2 => squared_l2(query, vector),
        DistanceMetric::Cosine => cosine_similarity(query, vector),
    }
}

/// Reported value; scores beyond the f32 range saturate so they stay
/// finite on the wire
fn reported(score: f64) -> f32 {
    (score as f32).clamp(f32::MIN, f32::MAX)
}

/// Smaller rank is better for both metrics
fn rank(metric: DistanceMetric, score: f64) -> f64 {
    let rank = match metric {
        DistanceMetric::L2 => score,
        DistanceMetric::Cosine => -score,
    };
    if rank.is_nan() { f64::INFINITY } else { rank + 0.0 }
}

// ===== Top-k =====

#[derive(Debug, Clone, Copy)]
struct Candidate {
    rank: f64,
    score: f64,
    id: EntityId,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Worse candidates compare greater, so the max-heap top is the one to evict
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .total_cmp(&other.rank)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Best `limit` entities for `query`, best first, ties by id ascending.
///
/// Returns `(index into entities, score)` pairs.
fn top_k(metric: DistanceMetric, query: &[f32], entities: &[Entity], limit: usize) -> Vec<(usize, f64)> {
    let mut heap = BinaryHeap::with_capacity(limit.min(entities.len()) + 1);

    for (index, entity) in entities.iter().enumerate() {
        let score = score(metric, query, &entity.vector);
        let candidate = Candidate {
            rank: rank(metric, score),
            score,
            id: entity.id,
            index,
        };

        if heap.len() < limit {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|c| (c.index, c.score))
        .collect()
}

/// Copy the named `fields` out of `metadata`, skipping unknown and `reserved` names
pub(crate) fn project(metadata: &Metadata, fields: &[String], reserved: &[&str]) -> Metadata {
    fields
        .iter()
        .filter(|name| !reserved.contains(&name.as_str()))
        .filter_map(|name| metadata.get(name).map(|value| (name.clone(), value.clone())))
        .collect()
}

// ===== Engine =====

/// Exact nearest-neighbour search over one collection.
///
/// Every query scans the whole collection; a search observes the collection
/// as committed when its scan ran.
pub struct SearchEngine<S: VectorStore> {
    registry: CollectionRegistry<S>,
    max_limit: usize,
}

impl<S: VectorStore> Clone for SearchEngine<S> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            max_limit: self.max_limit,
        }
    }
}

impl<S: VectorStore> SearchEngine<S> {
    pub fn new(registry: CollectionRegistry<S>, max_limit: usize) -> Self {
        Self {
            registry,
            max_limit,
        }
    }

    /// One ranked hit list per query vector, in query order
    pub async fn search(
        &self,
        ctx: &TenantContext,
        query: SearchQuery,
    ) -> VectorDbResult<Vec<Vec<SearchHit>>> {
        let collection = self.registry.get(ctx, &query.collection_name).await?;
        let limit = self.check_query(&collection, &query)?;

        let entities = bounded(
            self.registry.timeout(),
            "scan entities",
            self.registry.store().scan_entities(collection.id),
        )
        .await?;

        tracing::debug!(
            tenant = %ctx.namespace(),
            collection = %collection.name,
            queries = query.vectors.len(),
            limit,
            scanned = entities.len(),
            "Searching collection"
        );

        Ok(query
            .vectors
            .iter()
            .map(|vector| {
                top_k(collection.metric, vector, &entities, limit)
                    .into_iter()
                    .map(|(index, score)| {
                        let entity = &entities[index];
                        SearchHit {
                            id: entity.id,
                            distance: reported(score),
                            fields: project(&entity.metadata, &query.output_fields, &HIT_RESERVED),
                        }
                    })
                    .collect()
            })
            .collect())
    }

    fn check_query(&self, collection: &Collection, query: &SearchQuery) -> VectorDbResult<usize> {
        if query.vectors.is_empty() {
            return Err(VectorDbError::InvalidArgument(
                "search requires at least one query vector".to_string(),
            ));
        }
        if query.limit <= 0 {
            return Err(VectorDbError::InvalidArgument(format!(
                "limit must be positive, got {}",
                query.limit
            )));
        }
        if query.limit as u64 > self.max_limit as u64 {
            return Err(VectorDbError::InvalidArgument(format!(
                "limit {} exceeds the maximum of {}",
                query.limit, self.max_limit
            )));
        }
        match &query.anns_field {
            Some(field) if *field != collection.vector_field => {
                return Err(VectorDbError::InvalidArgument(format!(
                    "annsField '{}' is not the vector field of collection '{}'",
                    field, collection.name
                )));
            }
            _ => {}
        }
        for vector in &query.vectors {
            if vector.len() != collection.dimension {
                return Err(VectorDbError::DimensionMismatch {
                    expected: collection.dimension,
                    actual: vector.len(),
                });
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(VectorDbError::InvalidArgument(
                    "query components must be finite".to_string(),
                ));
            }
        }
        Ok(query.limit as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityStore;
    use crate::locks::CollectionLocks;
    use crate::models::{NewCollection, NewEntity};
    use crate::repository::InMemoryVectorStore;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn entity(id: EntityId, vector: Vec<f32>) -> Entity {
        Entity {
            id,
            vector,
            metadata: Metadata::new(),
        }
    }

    async fn setup(
        metric: DistanceMetric,
        dimension: i64,
    ) -> (SearchEngine<InMemoryVectorStore>, EntityStore<InMemoryVectorStore>, TenantContext) {
        let registry = CollectionRegistry::new(
            Arc::new(InMemoryVectorStore::new()),
            CollectionLocks::new(),
            Duration::from_secs(1),
            1024,
            DistanceMetric::L2,
        );
        let ctx = TenantContext::tenant("t1");
        registry
            .create(
                &ctx,
                NewCollection {
                    name: "docs".into(),
                    dimension,
                    metric: Some(metric),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (
            SearchEngine::new(registry.clone(), 100),
            EntityStore::new(registry),
            ctx,
        )
    }

    fn query(vectors: Vec<Vec<f32>>, limit: i64) -> SearchQuery {
        SearchQuery {
            collection_name: "docs".into(),
            vectors,
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_distances() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_k_orders_and_breaks_ties_by_id() {
        let entities = vec![
            entity(5, vec![2.0]),
            entity(3, vec![1.0]),
            entity(1, vec![-1.0]),
            entity(4, vec![0.0]),
        ];

        let ids: Vec<EntityId> = top_k(DistanceMetric::L2, &[0.0], &entities, 3)
            .into_iter()
            .map(|(i, _)| entities[i].id)
            .collect();
        // 1 and 3 are both at distance 1
        assert_eq!(ids, vec![4, 1, 3]);
    }

    #[test]
    fn test_top_k_cosine_is_descending() {
        let entities = vec![
            entity(1, vec![1.0, 0.0]),
            entity(2, vec![0.0, 1.0]),
            entity(3, vec![1.0, 1.0]),
            entity(4, vec![0.0, 0.0]),
        ];

        let ranked = top_k(DistanceMetric::Cosine, &[1.0, 0.0], &entities, 10);
        let ids: Vec<EntityId> = ranked.iter().map(|(i, _)| entities[*i].id).collect();
        assert_eq!(ids, vec![1, 3, 2, 4]);
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_top_k_matches_full_sort() {
        let builder = test_utils::TestDataBuilder::from_test_name("top_k_matches_full_sort");
        let entities: Vec<Entity> = (0..200).map(|i| entity(i, builder.vector(8, i as u64))).collect();
        let q = builder.vector(8, 1000);

        let mut expected: Vec<(f64, EntityId)> = entities
            .iter()
            .map(|e| (squared_l2(&q, &e.vector), e.id))
            .collect();
        expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let got: Vec<EntityId> = top_k(DistanceMetric::L2, &q, &entities, 17)
            .into_iter()
            .map(|(i, _)| entities[i].id)
            .collect();
        let want: Vec<EntityId> = expected.iter().take(17).map(|(_, id)| *id).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_project_skips_unknown_and_reserved() {
        let mut metadata = Metadata::new();
        metadata.insert("a".into(), json!(1));
        metadata.insert("id".into(), json!("shadow"));

        let fields = vec!["a".to_string(), "id".to_string(), "zzz".to_string()];
        let projected = project(&metadata, &fields, &HIT_RESERVED);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.get("a"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_exact_match_at_distance_zero() {
        let (engine, entities, ctx) = setup(DistanceMetric::L2, 5).await;
        let v = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        entities
            .insert(
                &ctx,
                "docs",
                vec![
                    NewEntity {
                        id: Some(1),
                        vector: v.clone(),
                        metadata: Some(json!({"title": "first"})),
                    },
                    NewEntity {
                        id: Some(2),
                        vector: vec![0.9; 5],
                        metadata: None,
                    },
                ],
            )
            .await
            .unwrap();

        let mut q = query(vec![v], 1);
        q.output_fields = vec!["title".into()];
        let results = engine.search(&ctx, q).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].len(), 1);
        assert_eq!(results[0][0].id, 1);
        assert_eq!(results[0][0].distance, 0.0);
        assert_eq!(results[0][0].fields.get("title"), Some(&json!("first")));
    }

    #[tokio::test]
    async fn test_huge_distances_stay_finite() {
        let (engine, entities, ctx) = setup(DistanceMetric::L2, 2).await;
        entities
            .insert(
                &ctx,
                "docs",
                vec![NewEntity {
                    id: Some(1),
                    vector: vec![f32::MAX, f32::MAX],
                    metadata: None,
                }],
            )
            .await
            .unwrap();

        let results = engine
            .search(&ctx, query(vec![vec![f32::MIN, f32::MIN]], 1))
            .await
            .unwrap();
        assert_eq!(results[0][0].distance, f32::MAX);
        let hit = serde_json::to_value(&results[0][0]).unwrap();
        assert!(hit["distance"].is_f64());
    }

    #[tokio::test]
    async fn test_search_is_idempotent_and_bounded() {
        let (engine, entities, ctx) = setup(DistanceMetric::L2, 2).await;
        let batch = (0..20)
            .map(|i| NewEntity {
                id: None,
                vector: vec![i as f32, 0.0],
                metadata: None,
            })
            .collect();
        entities.insert(&ctx, "docs", batch).await.unwrap();

        let first = engine
            .search(&ctx, query(vec![vec![3.2, 0.0], vec![18.9, 0.0]], 5))
            .await
            .unwrap();
        let second = engine
            .search(&ctx, query(vec![vec![3.2, 0.0], vec![18.9, 0.0]], 5))
            .await
            .unwrap();
        assert_eq!(first, second);

        for hits in &first {
            assert_eq!(hits.len(), 5);
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
            assert!(hits.iter().all(|h| h.fields.is_empty()));
        }
        assert_eq!(first[0][0].id, 4);
        assert_eq!(first[1][0].id, 20);
    }

    #[tokio::test]
    async fn test_search_validation() {
        let (engine, _, ctx) = setup(DistanceMetric::L2, 2).await;

        let cases = vec![
            query(vec![], 1),
            query(vec![vec![0.0, 0.0]], 0),
            query(vec![vec![0.0, 0.0]], 101),
            query(vec![vec![0.0, f32::INFINITY]], 1),
            SearchQuery {
                anns_field: Some("embedding".into()),
                ..query(vec![vec![0.0, 0.0]], 1)
            },
        ];
        for q in cases {
            let err = engine.search(&ctx, q).await.unwrap_err();
            assert!(matches!(err, VectorDbError::InvalidArgument(_)));
        }

        let err = engine
            .search(&ctx, query(vec![vec![0.0, 0.0, 0.0]], 1))
            .await
            .unwrap_err();
        assert!(matches!(err, VectorDbError::DimensionMismatch { .. }));

        let ok = SearchQuery {
            anns_field: Some("vector".into()),
            ..query(vec![vec![0.0, 0.0]], 1)
        };
        assert!(engine.search(&ctx, ok).await.unwrap()[0].is_empty());

        let err = engine
            .search(&TenantContext::tenant("t2"), query(vec![vec![0.0, 0.0]], 1))
            .await
            .unwrap_err();
        assert!(matches!(err, VectorDbError::NotFound(_)));
    }
}
