use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::TenantRecord;

/// Non-root tenants. Root lives in configuration only.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub secret_hash: String,
    /// Empty when the tenant registered without one
    #[sea_orm(column_type = "Text")]
    pub pub_key: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for TenantRecord {
    fn from(model: Model) -> Self {
        Self {
            name: model.name,
            secret_hash: model.secret_hash,
            pub_key: Some(model.pub_key).filter(|key| !key.is_empty()),
            created_at: model.created_at.into(),
        }
    }
}

impl From<TenantRecord> for ActiveModel {
    fn from(record: TenantRecord) -> Self {
        ActiveModel {
            name: Set(record.name),
            secret_hash: Set(record.secret_hash),
            pub_key: Set(record.pub_key.unwrap_or_default()),
            created_at: Set(record.created_at.into()),
        }
    }
}
