use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{ErrorCode, ErrorResponse};

/// Handler for 404 Not Found errors.
///
/// Used as the router fallback so unknown paths get the same error body as
/// every other failure.
pub async fn not_found() -> Response {
    let body = Json(ErrorResponse::new(
        ErrorCode::RouteNotFound,
        ErrorCode::RouteNotFound.default_message(),
    ));

    (StatusCode::NOT_FOUND, body).into_response()
}
