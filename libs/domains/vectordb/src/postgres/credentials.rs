use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};

use super::schema::tenants;
use crate::credentials::CredentialStore;
use crate::error::{VectorDbError, VectorDbResult};
use crate::models::TenantRecord;

/// PostgreSQL implementation of [`CredentialStore`] over the `tenants` table
#[derive(Clone)]
pub struct PgCredentialStore {
    db: DatabaseConnection,
}

impl PgCredentialStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create(&self, tenant: TenantRecord) -> VectorDbResult<()> {
        let name = tenant.name.clone();
        tenants::ActiveModel::from(tenant)
            .insert(&self.db)
            .await
            .map_err(|e| match VectorDbError::from(e) {
                VectorDbError::Conflict(_) => {
                    VectorDbError::Conflict(format!("user '{}' already exists", name))
                }
                other => other,
            })?;
        Ok(())
    }

    async fn find(&self, name: &str) -> VectorDbResult<Option<TenantRecord>> {
        let model = tenants::Entity::find_by_id(name.to_string())
            .one(&self.db)
            .await?;
        Ok(model.map(TenantRecord::from))
    }

    async fn list(&self) -> VectorDbResult<Vec<String>> {
        let names: Vec<String> = tenants::Entity::find()
            .select_only()
            .column(tenants::Column::Name)
            .order_by_asc(tenants::Column::Name)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(names)
    }

    async fn delete(&self, name: &str) -> VectorDbResult<bool> {
        let result = tenants::Entity::delete_by_id(name.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
