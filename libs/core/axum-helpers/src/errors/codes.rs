//! Numeric error codes carried in every error body.
//!
//! Success responses always carry `code: 0`; every failure carries one of the
//! non-zero codes below, so clients can branch on the body alone.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::DimensionMismatch;
//! assert_eq!(code.as_str(), "DIMENSION_MISMATCH");
//! assert_eq!(code.code(), 1102);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Code reported for successful responses
pub const SUCCESS_CODE: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Request errors (1000-1099)
    /// Request body failed `validator` checks
    ValidationError,
    /// Request body is not valid JSON for the endpoint
    InvalidJson,
    /// Argument outside its allowed domain (dimension, limit, names, ids)
    InvalidArgument,
    /// Route does not exist
    RouteNotFound,

    // Vector data errors (1100-1199)
    /// Requested tenant-scoped resource does not exist
    NotFound,
    /// Resource already exists
    Conflict,
    /// Vector length differs from the collection dimension
    DimensionMismatch,

    // Access errors (1800-1899)
    /// Missing, malformed or wrong credentials
    Unauthorized,
    /// Authenticated, but the operation needs the root identity
    Forbidden,

    // Server errors (1500-1599)
    /// Unexpected internal failure
    InternalError,
    /// Persistence did not answer in time
    Timeout,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::DimensionMismatch => "DIMENSION_MISMATCH",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Timeout => "TIMEOUT",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidJson => 1002,
            Self::InvalidArgument => 1003,
            Self::RouteNotFound => 1004,
            Self::NotFound => 1100,
            Self::Conflict => 1101,
            Self::DimensionMismatch => 1102,
            Self::Unauthorized => 1800,
            Self::Forbidden => 1801,
            Self::InternalError => 1500,
            Self::Timeout => 1504,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidJson => "Invalid JSON in request body",
            Self::InvalidArgument => "Invalid argument",
            Self::RouteNotFound => "The requested route does not exist",
            Self::NotFound => "Resource not found",
            Self::Conflict => "Resource already exists",
            Self::DimensionMismatch => "Vector dimension does not match the collection",
            Self::Unauthorized => "Invalid or missing credentials",
            Self::Forbidden => "Root privileges required",
            Self::InternalError => "An internal error occurred",
            Self::Timeout => "Storage did not respond in time",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
