//! Request extractors.

use crate::error::AppError;
use axum::{
    Json, async_trait,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

/// JSON request body.
///
/// Same as [`Json`], except that a body axum cannot decode is answered with the
/// API error envelope (see [`AppError`]) instead of a plain-text rejection.
///
/// ```ignore
/// async fn handler(ApiJson(profile): ApiJson<GuestProfile>) -> Result<Json<Guest>, AppError> {
///     ...
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
