use std::future::Future;
use std::time::Duration;

use crate::error::{VectorDbError, VectorDbResult};

/// Run one storage call, failing with [`VectorDbError::Timeout`] after `limit`.
///
/// Dropping the call on timeout rolls back any open transaction.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> VectorDbResult<T>
where
    F: Future<Output = VectorDbResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Storage call timed out"
            );
            Err(VectorDbError::Timeout(operation.to_string()))
        }
    }
}
