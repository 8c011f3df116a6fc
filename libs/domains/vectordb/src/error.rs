use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorDbError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("storage timed out during {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VectorDbResult<T> = Result<T, VectorDbError>;

impl VectorDbError {
    pub fn collection_not_found(name: &str) -> Self {
        VectorDbError::NotFound(format!("collection '{}' not found", name))
    }
}

impl From<DbErr> for VectorDbError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => VectorDbError::Conflict(detail),
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                VectorDbError::NotFound("collection no longer exists".to_string())
            }
            _ => match err {
                DbErr::ConnectionAcquire(e) => VectorDbError::Timeout(e.to_string()),
                other => VectorDbError::Internal(format!("Database error: {}", other)),
            },
        }
    }
}

impl From<serde_json::Error> for VectorDbError {
    fn from(err: serde_json::Error) -> Self {
        VectorDbError::Internal(format!("JSON error: {}", err))
    }
}

/// Convert VectorDbError to AppError for standardized HTTP error responses
impl From<VectorDbError> for AppError {
    fn from(err: VectorDbError) -> Self {
        match err {
            VectorDbError::Unauthorized(msg) => AppError::Unauthorized(msg),
            VectorDbError::Forbidden(msg) => AppError::Forbidden(msg),
            VectorDbError::NotFound(msg) => AppError::NotFound(msg),
            VectorDbError::Conflict(msg) => AppError::Conflict(msg),
            VectorDbError::InvalidArgument(msg) => AppError::InvalidArgument(msg),
            e @ VectorDbError::DimensionMismatch { .. } => AppError::DimensionMismatch(e.to_string()),
            e @ VectorDbError::Timeout(_) => AppError::GatewayTimeout(e.to_string()),
            VectorDbError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for VectorDbError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
