pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::{ErrorCode, SUCCESS_CODE};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Standard error response structure.
///
/// Returned for every failed request:
/// - `code`: non-zero integer error code (success bodies carry `0`)
/// - `error`: machine-readable error identifier (e.g. "NOT_FOUND")
/// - `message`: human-readable error message
/// - `detail`: the same text under the key older clients read
/// - `details`: optional additional error details (e.g. validation errors)
///
/// # JSON Example
///
/// ```json
/// {
///   "code": 1102,
///   "error": "DIMENSION_MISMATCH",
///   "message": "vector dimension mismatch: expected 4, got 3",
///   "detail": "vector dimension mismatch: expected 4, got 3"
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and client branching
    pub code: i32,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Copy of `message`
    #[serde(default)]
    pub detail: String,
    /// Optional structured error details (e.g. validation field errors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code: code.code(),
            error: code.as_str().to_string(),
            detail: message.clone(),
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type that can be converted to HTTP responses.
///
/// `Conflict` answers 400 rather than 409: existing clients of the
/// `/v2/vectordb` surface treat every caller mistake as a bad request.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Gateway Timeout: {0}")]
    GatewayTimeout(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl AppError {
    /// HTTP status and error code for this error
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::JsonExtractorRejection(JsonRejection::MissingJsonContentType(_)) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, ErrorCode::InvalidJson)
            }
            // Syntax and shape errors alike are a bad request
            AppError::JsonExtractorRejection(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidJson),
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
            AppError::BadRequest(_) | AppError::InvalidArgument(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidArgument)
            }
            AppError::DimensionMismatch(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::DimensionMismatch)
            }
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::Conflict(_) => (StatusCode::BAD_REQUEST, ErrorCode::Conflict),
            AppError::GatewayTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, ErrorCode::Timeout),
            AppError::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(error_code = code.code(), "JSON extraction error: {:?}", e);
                (e.body_text(), None)
            }
            AppError::ValidationError(e) => {
                tracing::info!(error_code = code.code(), "Validation error: {:?}", e);
                (
                    code.default_message().to_string(),
                    Some(validation_details(&e)),
                )
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(error_code = code.code(), "Internal server error: {}", msg);
                // Internal detail stays in the logs
                (code.default_message().to_string(), None)
            }
            AppError::GatewayTimeout(msg) => {
                tracing::warn!(error_code = code.code(), "Gateway timeout: {}", msg);
                (msg, None)
            }
            AppError::BadRequest(msg)
            | AppError::InvalidArgument(msg)
            | AppError::DimensionMismatch(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => {
                tracing::info!(error_code = code.code(), "{}: {}", code, msg);
                (msg, None)
            }
        };

        let mut body = ErrorResponse::new(code, message);
        if let Some(details) = details {
            body = body.with_details(details);
        }

        (status, Json(body)).into_response()
    }
}

/// Flatten validator errors into `{field: [{code, message, params}]}`
pub(crate) fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let details = errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let error_messages: Vec<serde_json::Value> = errors
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), serde_json::json!(error_messages))
        })
        .collect::<serde_json::Map<_, _>>();

    serde_json::Value::Object(details)
}

/// Helper function to create error responses.
///
/// # Example
///
/// ```rust
/// use axum::http::StatusCode;
/// use axum_helpers::errors::{error_response, ErrorCode};
///
/// let response = error_response(
///     StatusCode::BAD_REQUEST,
///     "limit must be positive".to_string(),
///     ErrorCode::InvalidArgument,
/// );
/// assert_eq!(response.status(), StatusCode::BAD_REQUEST);
/// ```
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    (status, Json(ErrorResponse::new(error_code, message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(error: AppError) -> (StatusCode, ErrorResponse) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (AppError::DimensionMismatch("x".into()), StatusCode::BAD_REQUEST),
            (AppError::GatewayTimeout("x".into()), StatusCode::GATEWAY_TIMEOUT),
            (
                AppError::InternalServerError("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            let (status, body) = body_of(error).await;
            assert_eq!(status, expected);
            assert_ne!(body.code, SUCCESS_CODE);
        }
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let (_, body) = body_of(AppError::NotFound("collection 'docs' not found".into())).await;
        assert_eq!(body.error, "NOT_FOUND");
        assert_eq!(body.code, ErrorCode::NotFound.code());
        assert_eq!(body.message, "collection 'docs' not found");
        assert_eq!(body.detail, body.message);
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (_, body) =
            body_of(AppError::InternalServerError("connection reset by peer".into())).await;
        assert_eq!(body.error, "INTERNAL_ERROR");
        assert!(!body.message.contains("connection reset"));
    }
}
