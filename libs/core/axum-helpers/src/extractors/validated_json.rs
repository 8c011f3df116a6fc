//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Validates the request body using the `validator` crate's `Validate` trait.
/// Both malformed JSON and failed validation are rejected with the standard
/// [`ErrorResponse`](crate::errors::ErrorResponse) body.
///
/// # Example
/// ```ignore
/// use axum::Router;
/// use axum::routing::post;
/// use axum_helpers::extractors::ValidatedJson;
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct CreateCollection {
///     #[validate(length(min = 1, max = 255))]
///     name: String,
///     #[validate(range(min = 1))]
///     dimension: usize,
/// }
///
/// async fn create(ValidatedJson(payload): ValidatedJson<CreateCollection>) -> String {
///     format!("Creating collection: {}", payload.name)
/// }
///
/// let app = Router::new().route("/collections/create", post(create));
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedJson(data))
    }
}
