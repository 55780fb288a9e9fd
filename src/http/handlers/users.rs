use crate::domain::user::{AddressUpdate, NewUser, UserCreated, UserPatch};
use crate::service::user_service::Registration;
use crate::http::extract::{ApiJson, RecordId};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub async fn list_users(State(state): State<AppState>) -> impl IntoResponse {
    match state.user_service.list_all().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> impl IntoResponse {
    match state.user_service.get_by_email(&email).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewUser>,
) -> impl IntoResponse {
    match state.user_service.register(req).await {
        Ok(Registration::Created(user)) => (
            StatusCode::CREATED,
            Json(UserCreated {
                message: "User was created and email was sent",
                user,
            }),
        )
            .into_response(),
        Ok(Registration::AlreadyExists(user)) => (
            StatusCode::OK,
            Json(UserCreated {
                message: "User already exists",
                user,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn toggle_user_disabled(
    State(state): State<AppState>,
    RecordId(user_id): RecordId,
) -> impl IntoResponse {
    match state.user_service.toggle_disabled(user_id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn toggle_user_privilege(
    State(state): State<AppState>,
    RecordId(user_id): RecordId,
) -> impl IntoResponse {
    match state.user_service.toggle_privilege(user_id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn modify_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> impl IntoResponse {
    match state.user_service.modify(&email, patch).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_user_address(
    State(state): State<AppState>,
    Path(email): Path<String>,
    ApiJson(req): ApiJson<AddressUpdate>,
) -> impl IntoResponse {
    match state.user_service.update_address(&email, req.address).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}
