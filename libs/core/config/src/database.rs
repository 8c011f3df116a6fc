use crate::{env_parse, ConfigError, FromEnv};

/// Relational backend settings.
///
/// `url` is optional: without `DATABASE_URL` the server keeps everything in
/// memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_retries: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 20,
            connect_retries: 5,
        }
    }
}

impl FromEnv for DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        Ok(Self {
            url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 20)?,
            connect_retries: env_parse("DATABASE_CONNECT_RETRIES", 5)?,
        })
    }
}
