use crate::domain::product::{NewProduct, ProductFilter, ProductPatch, ProductSearchQuery, StockLevels};
use crate::http::extract::{ApiJson, ApiQuery, RecordId};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub async fn list_products(State(state): State<AppState>) -> impl IntoResponse {
    match state.product_service.list_all().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> impl IntoResponse {
    match state.product_service.by_category(&category).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn products_by_brand(
    State(state): State<AppState>,
    Path(brand): Path<String>,
) -> impl IntoResponse {
    match state.product_service.by_brand(&brand).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_product(
    State(state): State<AppState>,
    RecordId(product_id): RecordId,
) -> impl IntoResponse {
    match state.product_service.get(product_id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewProduct>,
) -> impl IntoResponse {
    match state.product_service.create(req).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn toggle_product_disabled(
    State(state): State<AppState>,
    RecordId(product_id): RecordId,
) -> impl IntoResponse {
    match state.product_service.toggle_disabled(product_id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn toggle_product_featured(
    State(state): State<AppState>,
    RecordId(product_id): RecordId,
) -> impl IntoResponse {
    match state.product_service.toggle_featured(product_id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn modify_product(
    State(state): State<AppState>,
    RecordId(product_id): RecordId,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> impl IntoResponse {
    match state.product_service.modify(product_id, patch).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn control_stock(
    State(state): State<AppState>,
    RecordId(product_id): RecordId,
    ApiJson(levels): ApiJson<StockLevels>,
) -> impl IntoResponse {
    match state.product_service.control_stock(product_id, levels).await {
        Ok(stock) => (StatusCode::OK, Json(stock)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_product(
    State(state): State<AppState>,
    RecordId(product_id): RecordId,
) -> impl IntoResponse {
    match state.product_service.delete(product_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "product deleted"})),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn search_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductSearchQuery>,
) -> impl IntoResponse {
    match state.product_service.search(query.name.as_deref()).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn filter_products(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> impl IntoResponse {
    match state.product_service.filter(filter).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => e.into_response(),
    }
}
