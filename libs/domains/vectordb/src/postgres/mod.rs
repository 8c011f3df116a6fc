//! PostgreSQL backend: connection setup and the sea-orm implementations of
//! [`VectorStore`](crate::repository::VectorStore) and
//! [`CredentialStore`](crate::credentials::CredentialStore).

mod credentials;
pub mod schema;
mod store;

pub use credentials::PgCredentialStore;
pub use store::PgVectorStore;

use core_config::database::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::future::Future;
use std::time::Duration;

/// Exponential backoff for start-up connection attempts
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Retry `operation` until it succeeds or `config.max_retries` is spent
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, config: &RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(retries = attempt, "Operation succeeded after retrying");
                }
                return Ok(value);
            }
            Err(e) if attempt >= config.max_retries => {
                tracing::warn!(attempts = attempt + 1, error = %e, "Giving up");
                return Err(e);
            }
            Err(e) => {
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(config.max_delay);
            }
        }
    }
}

pub fn connect_options(url: &str, max_connections: u32, acquire_timeout: Duration) -> ConnectOptions {
    let mut opt = ConnectOptions::new(url);
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(acquire_timeout)
        .sqlx_logging(false);
    opt
}

/// Connect with retry. `None` when no database URL is configured.
///
/// The pool's acquire timeout is the per-call store timeout, so an exhausted
/// pool surfaces as a timeout rather than a hang.
pub async fn connect(
    config: &DatabaseConfig,
    acquire_timeout: Duration,
) -> Result<Option<DatabaseConnection>, DbErr> {
    let Some(url) = config.url.as_deref() else {
        return Ok(None);
    };

    let retry = RetryConfig {
        max_retries: config.connect_retries,
        ..RetryConfig::default()
    };
    let db = retry_with_backoff(
        || Database::connect(connect_options(url, config.max_connections, acquire_timeout)),
        &retry,
    )
    .await?;

    tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL");
    Ok(Some(db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("not yet")
                    } else {
                        Ok("connected")
                    }
                }
            },
            &fast(),
        )
        .await;

        assert_eq!(result, Ok("connected"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), &str> = retry_with_backoff(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err("refused")
                }
            },
            &fast(),
        )
        .await;

        assert_eq!(result, Err("refused"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_connect_without_url_is_none() {
        let db = connect(&DatabaseConfig::in_memory(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(db.is_none());
    }
}
