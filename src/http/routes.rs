use crate::http::handlers::{bills, ops, products, reviews, users};
use crate::http::middleware::{admin_auth, rate_limit};
use crate::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use axum::Router;

pub struct RouterOptions {
    pub admin_key: String,
    /// `None` turns rate limiting off.
    pub rate_limit: Option<rate_limit::RateLimitState>,
}

pub fn build_router(state: AppState, options: RouterOptions) -> Router {
    let admin_routes = Router::new()
        .route("/bills/:id", put(bills::update_bill_disabled))
        .route("/products/create", post(products::create_product))
        .route("/products/disable/:id", put(products::toggle_product_disabled))
        .route("/products/featured/:id", put(products::toggle_product_featured))
        .route("/products/modify/:id", put(products::modify_product))
        .route("/products/modify/stock/:id", put(products::control_stock))
        .route("/products/delete/:id", delete(products::delete_product))
        .route("/reviews/disable/:id", put(reviews::toggle_review_disabled))
        .route("/users/disable/:id", put(users::toggle_user_disabled))
        .route("/users/privilege/:id", put(users::toggle_user_privilege))
        .layer(from_fn_with_state(
            options.admin_key,
            admin_auth::require_internal_api_key,
        ));

    let mut app = Router::new()
        .route("/health", get(ops::health))
        .route("/ops/readiness", get(ops::readiness))
        .route("/ops/liveness", get(ops::liveness))
        .route("/bills", get(bills::list_bills))
        .route("/bills/create", post(bills::create_bill))
        .route("/bills/search", get(bills::search_bills))
        .route("/products", get(products::list_products))
        .route("/products/category/:category", get(products::products_by_category))
        .route("/products/brand/:brand", get(products::products_by_brand))
        .route("/products/:id", get(products::get_product))
        .route("/search", get(products::search_products))
        .route("/filtrado", get(products::filter_products))
        .route("/reviews", get(reviews::list_reviews))
        .route("/reviews/create", post(reviews::create_review))
        .route("/reviews/:id", get(reviews::get_review))
        .route("/users", get(users::list_users))
        .route("/users/create", post(users::create_user))
        .route("/users/modify/:email", put(users::modify_user))
        .route("/users/address/:email", put(users::update_user_address))
        .route("/users/:email", get(users::get_user))
        .merge(admin_routes);

    if let Some(limits) = options.rate_limit {
        app = app.layer(from_fn_with_state(limits, rate_limit::enforce));
    }

    // Merged after the rate limit layer so gateway deliveries are never throttled.
    let notifications = Router::new().route(
        "/bills/payment/notification",
        post(bills::payment_notification).get(bills::payment_notification),
    );

    app.merge(notifications).with_state(state)
}
