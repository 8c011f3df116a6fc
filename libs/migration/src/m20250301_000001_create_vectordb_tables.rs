use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Non-root tenants. Root lives in configuration, never in this table.
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(string_len(Tenants::Name, 255).primary_key())
                    .col(string(Tenants::SecretHash))
                    .col(text(Tenants::PubKey).default(""))
                    .col(
                        timestamp_with_time_zone(Tenants::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Collections::Table)
                    .if_not_exists()
                    .col(pk_uuid(Collections::Id))
                    .col(string_len(Collections::Tenant, 255))
                    .col(string_len(Collections::Name, 255))
                    .col(integer(Collections::Dimension))
                    .col(string_len(Collections::Metric, 16).default("L2"))
                    .col(string_len(Collections::VectorField, 255).default("vector"))
                    .col(json(Collections::Fields).default("[]"))
                    .col(big_integer(Collections::LastEntityId).default(0))
                    .col(
                        timestamp_with_time_zone(Collections::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One collection name per tenant
        manager
            .create_index(
                Index::create()
                    .name("idx_collections_tenant_name")
                    .table(Collections::Table)
                    .col(Collections::Tenant)
                    .col(Collections::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Entities::Table)
                    .if_not_exists()
                    .col(uuid(Entities::CollectionId))
                    .col(big_integer(Entities::EntityId))
                    .col(blob(Entities::Vector))
                    .col(json(Entities::Metadata).default("{}"))
                    .col(
                        timestamp_with_time_zone(Entities::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(Entities::CollectionId)
                            .col(Entities::EntityId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entities_collection")
                            .from(Entities::Table, Entities::CollectionId)
                            .to(Collections::Table, Collections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Entities::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Collections::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Tenants {
    Table,
    Name,
    SecretHash,
    PubKey,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Collections {
    Table,
    Id,
    Tenant,
    Name,
    Dimension,
    Metric,
    VectorField,
    Fields,
    LastEntityId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Entities {
    Table,
    CollectionId,
    EntityId,
    Vector,
    Metadata,
    CreatedAt,
}
