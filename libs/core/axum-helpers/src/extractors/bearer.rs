use crate::errors::AppError;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

/// Raw token from `Authorization: Bearer <token>`.
///
/// Only extracts; verifying the token is up to the handler's service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

/// Extract the bearer token from the Authorization header
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match extract_token(&parts.headers) {
            Some(token) => Ok(BearerToken(token)),
            None => {
                tracing::debug!("No bearer token in Authorization header");
                Err(AppError::Unauthorized("missing bearer token".to_string()))
            }
        }
    }
}
