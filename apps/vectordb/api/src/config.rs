use core_config::{AppInfo, FromEnv, app_info, database::DatabaseConfig, server::ServerConfig};
use domain_vectordb::VectorDbConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Server configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub vectordb: VectorDbConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080
        let database = DatabaseConfig::from_env()?; // in-memory when DATABASE_URL is unset
        let vectordb = VectorDbConfig::from_env()?; // VECTORDB_ROOT_PASSWORD is required

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            database,
            vectordb,
        })
    }
}
