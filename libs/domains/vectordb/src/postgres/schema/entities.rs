use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::error::{VectorDbError, VectorDbResult};
use crate::models::{Entity as StoredEntity, Metadata};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub collection_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub entity_id: i64,
    /// Little-endian f32 components
    pub vector: Vec<u8>,
    pub metadata: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

pub fn decode_vector(bytes: &[u8]) -> VectorDbResult<Vec<f32>> {
    let chunks = bytes.chunks_exact(4);
    if !chunks.remainder().is_empty() {
        return Err(VectorDbError::Internal(format!(
            "stored vector has {} bytes, not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(chunks
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

impl TryFrom<Model> for StoredEntity {
    type Error = VectorDbError;

    fn try_from(model: Model) -> VectorDbResult<Self> {
        let metadata = match model.metadata {
            Json::Object(map) => map,
            Json::Null => Metadata::new(),
            other => {
                return Err(VectorDbError::Internal(format!(
                    "entity {} has non-object metadata: {}",
                    model.entity_id, other
                )));
            }
        };

        Ok(Self {
            id: model.entity_id,
            vector: decode_vector(&model.vector)?,
            metadata,
        })
    }
}

/// Row for an upsert; `created_at` is left to the column default
pub fn active_model(collection_id: Uuid, entity: StoredEntity) -> ActiveModel {
    ActiveModel {
        collection_id: Set(collection_id),
        entity_id: Set(entity.id),
        vector: Set(encode_vector(&entity.vector)),
        metadata: Set(Json::Object(entity.metadata)),
        created_at: NotSet,
    }
}
