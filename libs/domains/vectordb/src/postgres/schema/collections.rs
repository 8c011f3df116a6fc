use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::error::{VectorDbError, VectorDbResult};
use crate::models::{Collection, DistanceMetric};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "collections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant: String,
    pub name: String,
    pub dimension: i32,
    pub metric: String,
    pub vector_field: String,
    /// JSON array of field names
    pub fields: Json,
    /// Last automatically assigned entity id
    pub last_entity_id: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Collection {
    type Error = VectorDbError;

    fn try_from(model: Model) -> VectorDbResult<Self> {
        let metric: DistanceMetric = model.metric.parse().map_err(|e: String| {
            VectorDbError::Internal(format!("collection {}: {}", model.id, e))
        })?;
        let dimension = usize::try_from(model.dimension).map_err(|_| {
            VectorDbError::Internal(format!(
                "collection {} has invalid dimension {}",
                model.id, model.dimension
            ))
        })?;

        Ok(Self {
            id: model.id,
            tenant: model.tenant,
            name: model.name,
            dimension,
            metric,
            vector_field: model.vector_field,
            fields: serde_json::from_value(model.fields)?,
            created_at: model.created_at.into(),
        })
    }
}

impl TryFrom<&Collection> for ActiveModel {
    type Error = VectorDbError;

    fn try_from(collection: &Collection) -> VectorDbResult<Self> {
        let dimension = i32::try_from(collection.dimension).map_err(|_| {
            VectorDbError::InvalidArgument(format!(
                "dimension {} is too large to store",
                collection.dimension
            ))
        })?;

        Ok(ActiveModel {
            id: Set(collection.id),
            tenant: Set(collection.tenant.clone()),
            name: Set(collection.name.clone()),
            dimension: Set(dimension),
            metric: Set(collection.metric.to_string()),
            vector_field: Set(collection.vector_field.clone()),
            fields: Set(serde_json::to_value(&collection.fields)?),
            last_entity_id: NotSet,
            created_at: Set(collection.created_at.into()),
        })
    }
}
