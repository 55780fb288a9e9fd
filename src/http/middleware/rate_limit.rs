use crate::error::err;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use redis::AsyncCommands;

#[derive(Clone)]
pub struct RateLimitState {
    pub redis_client: redis::Client,
    pub max_per_minute: i64,
}

pub fn client_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Fixed one-minute window per client IP. Requests pass when Redis is
/// unreachable.
pub async fn enforce(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = format!(
        "storefront:rate:{}:{}",
        client_ip(&request),
        chrono::Utc::now().format("%Y%m%d%H%M")
    );

    match state.redis_client.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            let count: i64 = conn.incr(&key, 1).await.unwrap_or(1);
            let _: bool = conn.expire(&key, 120).await.unwrap_or(false);
            if count > state.max_per_minute {
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(err("RATE_LIMITED", "rate limit exceeded", None)),
                )
                    .into_response();
            }
        }
        Err(e) => tracing::debug!(error = %e, "rate limiter unavailable, letting request through"),
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::client_ip;
    use axum::body::Body;
    use axum::http::Request;

    #[test]
    fn takes_first_forwarded_address() {
        let req = Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 172.16.0.2")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&req), "10.0.0.1");
    }

    #[test]
    fn falls_back_without_header() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req), "unknown");
    }
}
