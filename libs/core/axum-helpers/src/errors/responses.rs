//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Bad Request - invalid argument, dimension mismatch or duplicate resource",
    content_type = "application/json",
    example = json!({
        "code": 1102,
        "error": "DIMENSION_MISMATCH",
        "message": "vector dimension mismatch: expected 4, got 3"
    })
)]
pub struct BadRequestResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Unauthorized - missing or invalid credentials",
    content_type = "application/json",
    example = json!({
        "code": 1800,
        "error": "UNAUTHORIZED",
        "message": "invalid credentials"
    })
)]
pub struct UnauthorizedResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Forbidden - root privileges required",
    content_type = "application/json",
    example = json!({
        "code": 1801,
        "error": "FORBIDDEN",
        "message": "operation requires the root identity"
    })
)]
pub struct ForbiddenResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Resource not found",
    content_type = "application/json",
    example = json!({
        "code": 1100,
        "error": "NOT_FOUND",
        "message": "collection 'docs' not found"
    })
)]
pub struct NotFoundResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Gateway Timeout - storage did not respond in time",
    content_type = "application/json",
    example = json!({
        "code": 1504,
        "error": "TIMEOUT",
        "message": "Storage did not respond in time"
    })
)]
pub struct TimeoutResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "code": 1500,
        "error": "INTERNAL_ERROR",
        "message": "An internal error occurred"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);
