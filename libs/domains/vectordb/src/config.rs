use core_config::{ConfigError, FromEnv, env_or_default, env_parse, env_required};
use std::fmt;
use std::time::Duration;

use crate::models::{DistanceMetric, validate_name};

/// Service settings, passed into each constructed [`VectorDbService`].
///
/// [`VectorDbService`]: crate::service::VectorDbService
#[derive(Clone)]
pub struct VectorDbConfig {
    /// Reserved administrative identity
    pub root_user: String,
    pub root_password: String,
    /// Metric for collections created without one
    pub default_metric: DistanceMetric,
    /// Upper bound on every storage call
    pub store_timeout: Duration,
    pub max_dimension: usize,
    pub max_search_limit: usize,
}

impl VectorDbConfig {
    pub fn new(root_user: impl Into<String>, root_password: impl Into<String>) -> Self {
        Self {
            root_user: root_user.into(),
            root_password: root_password.into(),
            default_metric: DistanceMetric::L2,
            store_timeout: Duration::from_millis(5000),
            max_dimension: 32_768,
            max_search_limit: 16_384,
        }
    }

    pub fn with_default_metric(mut self, metric: DistanceMetric) -> Self {
        self.default_metric = metric;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: usize) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn with_max_search_limit(mut self, max_search_limit: usize) -> Self {
        self.max_search_limit = max_search_limit;
        self
    }
}

impl fmt::Debug for VectorDbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorDbConfig")
            .field("root_user", &self.root_user)
            .field("root_password", &"<redacted>")
            .field("default_metric", &self.default_metric)
            .field("store_timeout", &self.store_timeout)
            .field("max_dimension", &self.max_dimension)
            .field("max_search_limit", &self.max_search_limit)
            .finish()
    }
}

impl FromEnv for VectorDbConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let root_user = env_or_default("VECTORDB_ROOT_USER", "root");
        validate_name("root", &root_user).map_err(|e| ConfigError::InvalidValue {
            key: "VECTORDB_ROOT_USER".to_string(),
            details: e.to_string(),
        })?;

        let root_password = env_required("VECTORDB_ROOT_PASSWORD")?;
        if root_password.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "VECTORDB_ROOT_PASSWORD".to_string(),
                details: "must not be empty".to_string(),
            });
        }

        let timeout_ms: u64 = env_parse("VECTORDB_STORE_TIMEOUT_MS", 5000)?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "VECTORDB_STORE_TIMEOUT_MS".to_string(),
                details: "must be positive".to_string(),
            });
        }

        Ok(Self {
            root_user,
            root_password,
            default_metric: env_parse("VECTORDB_DEFAULT_METRIC", DistanceMetric::L2)?,
            store_timeout: Duration::from_millis(timeout_ms),
            max_dimension: env_parse("VECTORDB_MAX_DIMENSION", 32_768)?,
            max_search_limit: env_parse("VECTORDB_MAX_SEARCH_LIMIT", 16_384)?,
        })
    }
}
