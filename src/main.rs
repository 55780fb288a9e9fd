use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront_api::config::{AppConfig, GatewayKind, StorageBackend};
use storefront_api::gateways::mercadopago::MercadoPagoGateway;
use storefront_api::gateways::mock::MockGateway;
use storefront_api::gateways::PaymentGateway;
use storefront_api::http::middleware::rate_limit::RateLimitState;
use storefront_api::http::routes::{build_router, RouterOptions};
use storefront_api::{AppState, Stores};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let (stores, pool) = match cfg.storage_backend {
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&cfg.database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            (Stores::postgres(&pool), Some(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, data is lost on restart");
            (Stores::in_memory(), None)
        }
    };

    let gateway: Arc<dyn PaymentGateway> = match cfg.payment_gateway {
        GatewayKind::MercadoPago => {
            if cfg.mercadopago_access_token.is_empty() {
                tracing::warn!("MERCADOPAGO_ACCESS_TOKEN is empty, gateway calls will be rejected");
            }
            Arc::new(MercadoPagoGateway {
                base_url: cfg.mercadopago_base_url.clone(),
                access_token: cfg.mercadopago_access_token.clone(),
                sandbox: cfg.mercadopago_sandbox,
                currency_id: cfg.default_currency.clone(),
                timeout_ms: cfg.gateway_timeout_ms,
                client: reqwest::Client::new(),
            })
        }
        GatewayKind::Mock => Arc::new(MockGateway::new(
            format!("{}/mock-checkout", cfg.public_base_url.trim_end_matches('/')),
            "",
        )),
    };

    let redis_client = if cfg.redis_url.trim().is_empty() {
        None
    } else {
        Some(redis::Client::open(cfg.redis_url.clone())?)
    };

    let mut state = AppState::new(stores, gateway, cfg.notification_url());
    state.pool = pool;
    state.redis_client = redis_client.clone();

    let app = build_router(
        state,
        RouterOptions {
            admin_key: cfg.internal_api_key.clone(),
            rate_limit: redis_client.map(|client| RateLimitState {
                redis_client: client,
                max_per_minute: cfg.rate_limit_per_minute,
            }),
        },
    );

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(
        bind_addr = %cfg.bind_addr,
        storage = ?cfg.storage_backend,
        gateway = ?cfg.payment_gateway,
        "listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
