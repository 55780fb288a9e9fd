//! Extractors that report malformed input through the error envelope
//! instead of axum's plain-text rejections.

use crate::error::{bad_request, ServiceError};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// JSON body; any rejection (syntax, types, content type) becomes a 400.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(bad_request(&rejection.body_text())),
        }
    }
}

/// Query string; unparsable values become a 400.
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(ApiQuery(value)),
            Err(rejection) => Err(bad_request(&rejection.body_text())),
        }
    }
}

/// Single `:id` path segment. An id that is not a UUID cannot name a
/// record, so it is answered like any other unknown id.
pub struct RecordId(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(raw)) => Uuid::parse_str(raw.trim())
                .map(RecordId)
                .map_err(|_| ServiceError::not_found(format!("record '{raw}'")).into_response()),
            Err(rejection) => Err(ServiceError::not_found(rejection.body_text()).into_response()),
        }
    }
}
