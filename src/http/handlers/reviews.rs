use crate::domain::review::NewReview;
use crate::http::extract::{ApiJson, RecordId};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub async fn list_reviews(State(state): State<AppState>) -> impl IntoResponse {
    match state.review_service.list_all().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_review(
    State(state): State<AppState>,
    RecordId(review_id): RecordId,
) -> impl IntoResponse {
    match state.review_service.get(review_id).await {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_review(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewReview>,
) -> impl IntoResponse {
    match state.review_service.create(req).await {
        Ok(review) => (StatusCode::CREATED, Json(review)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn toggle_review_disabled(
    State(state): State<AppState>,
    RecordId(review_id): RecordId,
) -> impl IntoResponse {
    match state.review_service.toggle_disabled(review_id).await {
        Ok(review) => (StatusCode::OK, Json(review)).into_response(),
        Err(e) => e.into_response(),
    }
}
