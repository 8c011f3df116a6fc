use axum::Router;
use axum_helpers::server::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_vectordb::{
    CredentialStore, InMemoryCredentialStore, InMemoryVectorStore, PgCredentialStore,
    PgVectorStore, VectorDbConfig, VectorDbService, VectorStore, handlers, postgres,
};
use migration::{Migrator, MigratorTrait};
use tracing::info;

mod config;
mod openapi;

use config::Config;

/// Vector database routes over the given backend
fn vectordb_routes<C, S>(credentials: C, store: S, config: &VectorDbConfig) -> eyre::Result<Router>
where
    C: CredentialStore + 'static,
    S: VectorStore + 'static,
{
    let service = VectorDbService::new(credentials, store, config)?;
    Ok(handlers::router(service))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let db = postgres::connect(&config.database, config.vectordb.store_timeout)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    let api_routes = match &db {
        Some(db) => {
            Migrator::up(db, None)
                .await
                .map_err(|e| eyre::eyre!("Migration failed: {}", e))?;
            info!("Migrations applied, using PostgreSQL backend");

            vectordb_routes(
                PgCredentialStore::new(db.clone()),
                PgVectorStore::new(db.clone()),
                &config.vectordb,
            )?
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data is kept in memory only");
            vectordb_routes(
                InMemoryCredentialStore::new(),
                InMemoryVectorStore::new(),
                &config.vectordb,
            )?
        }
    };

    // create_router adds docs/middleware to our composed routes
    let router = create_router::<openapi::ApiDoc>(api_routes)?;

    // - /health: liveness check with app name/version
    let app = router.merge(health_router(config.app));

    info!(
        root_user = %config.vectordb.root_user,
        default_metric = %config.vectordb.default_metric,
        "Starting vector database API"
    );

    create_app(app, &config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    if let Some(db) = db {
        match db.close().await {
            Ok(_) => info!("PostgreSQL connection closed successfully"),
            Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
        }
    }

    info!("Vector database API shutdown complete");
    Ok(())
}
