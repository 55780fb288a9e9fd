use crate::domain::bill::{BillSearchQuery, CreateBillRequest, SetDisabledRequest};
use crate::domain::notification::parse_notification;
use crate::error::bad_request;
use crate::http::extract::{ApiJson, ApiQuery, RecordId};
use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::collections::HashMap;

pub async fn list_bills(State(state): State<AppState>) -> impl IntoResponse {
    match state.bill_service.list_all().await {
        Ok(bills) => (StatusCode::OK, Json(bills)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_bill(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateBillRequest>,
) -> impl IntoResponse {
    match state.bill_service.create_bill(req).await {
        Ok(created) => (StatusCode::CREATED, Json(created.checkout_url)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Gateway webhook. Always answers 200 so the gateway stops redelivering;
/// processing problems are only logged.
pub async fn payment_notification(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> impl IntoResponse {
    let notification = parse_notification(&query, &body);

    match (&notification.topic, &notification.payment_id) {
        (Some(topic), Some(payment_id)) => {
            match state.bill_service.handle_notification(topic, payment_id).await {
                Ok(outcome) => {
                    tracing::info!(topic = %topic, payment_id = %payment_id, outcome = ?outcome, "notification processed")
                }
                Err(e) => {
                    tracing::error!(topic = %topic, payment_id = %payment_id, error = %e, "notification processing failed")
                }
            }
        }
        (Some(topic), None) if notification.is_payment() => {
            tracing::warn!(topic = %topic, "payment notification without payment id");
        }
        _ => {
            tracing::debug!(topic = ?notification.topic, "notification acknowledged without processing");
        }
    }

    (StatusCode::OK, Json(serde_json::json!({"received": true})))
}

/// `{"disabled": bool}` sets the flag; an empty body flips it.
pub async fn update_bill_disabled(
    State(state): State<AppState>,
    RecordId(bill_id): RecordId,
    body: Bytes,
) -> impl IntoResponse {
    let result = if body.iter().all(u8::is_ascii_whitespace) {
        state.bill_service.toggle_disabled(bill_id).await
    } else {
        match serde_json::from_slice::<SetDisabledRequest>(&body) {
            Ok(req) => state.bill_service.set_disabled(bill_id, req.disabled).await,
            Err(e) => return bad_request(&format!("invalid body: {e}")),
        }
    };

    match result {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn search_bills(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BillSearchQuery>,
) -> impl IntoResponse {
    match state.bill_service.search(query).await {
        Ok(bills) => (StatusCode::OK, Json(bills)).into_response(),
        Err(e) => e.into_response(),
    }
}
