//! Rate limiting middleware for axum.
//!
//! Each rate-limited route group gets its own [`RateLimitState`] naming the
//! resource it spends. Signed-in callers are keyed by user id, everyone else
//! by client IP. A failing backend lets the request through.
//!
//! Rate limit status is returned in standard HTTP headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `X-RateLimit-Reset`: Unix timestamp when the window resets
//! - `Retry-After`: Seconds to wait (only on 429 response)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::ErrorResponse;
use crate::adapters::rate_limiter::{check_fail_open, RateLimitDecision};
use crate::domain::foundation::{AuthenticatedUser, ErrorCode};
use crate::ports::{RateLimitKey, RateLimiter};

/// Used when neither proxy headers nor connect info name the client.
const UNKNOWN_CLIENT: &str = "unknown";

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    /// Maximum requests allowed in the window.
    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    /// Requests remaining in the current window.
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
    /// Unix timestamp when the window resets.
    pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
}

/// Limiter plus the resource a route group spends.
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<dyn RateLimiter>,
    resource: &'static str,
}

impl RateLimitState {
    pub fn new(limiter: Arc<dyn RateLimiter>, resource: &'static str) -> Self {
        Self { limiter, resource }
    }
}

/// Spends one request from the caller's budget for the route's resource.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let key = match request.extensions().get::<AuthenticatedUser>() {
        Some(user) => RateLimitKey::user(&user.id, state.resource),
        None => {
            let ip = extract_client_ip(&request, connect_info.as_ref())
                .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
            RateLimitKey::ip(&ip, state.resource)
        }
    };

    match check_fail_open(state.limiter.as_ref(), key).await {
        RateLimitDecision::Denied(denied) => {
            tracing::info!(
                scope = %denied.scope,
                resource = state.resource,
                retry_after_secs = denied.retry_after_secs,
                "Rate limit exceeded"
            );
            rate_limit_response(denied.limit, denied.retry_after_secs, denied.reset_at.as_unix_secs())
        }
        RateLimitDecision::Allowed(status) => {
            let mut response = next.run(request).await;
            if let Some(status) = status {
                add_rate_limit_headers(
                    &mut response,
                    status.limit,
                    status.remaining,
                    status.reset_at.as_unix_secs(),
                );
            }
            response
        }
    }
}

/// Extract client IP from request, checking forwarded headers first.
///
/// Order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
fn extract_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first_ip) = header("X-Forwarded-For")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return Some(first_ip.to_string());
    }

    if let Some(real_ip) = header("X-Real-IP") {
        return Some(real_ip.to_string());
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

fn rate_limit_response(limit: u32, retry_after_secs: u32, reset_at: u64) -> Response {
    let body = ErrorResponse::new(ErrorCode::RateLimited, "Too many requests, slow down a little.")
        .with_details(serde_json::json!({ "retryAfterSecs": retry_after_secs }));
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

    add_rate_limit_headers(&mut response, limit, 0, reset_at);
    response
        .headers_mut()
        .insert(axum::http::header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    response
}

fn add_rate_limit_headers(response: &mut Response, limit: u32, remaining: u32, reset_at: u64) {
    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(remaining));
    headers.insert(headers::X_RATELIMIT_RESET.clone(), HeaderValue::from(reset_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig, CHAT_RESOURCE};
    use crate::domain::foundation::UserId;
    use crate::ports::{RateLimitError, RateLimitResult};
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, middleware, routing::post, Router};
    use tower::ServiceExt;

    struct BrokenLimiter;

    #[async_trait]
    impl RateLimiter for BrokenLimiter {
        async fn check(&self, _key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
            Err(RateLimitError::Unavailable("connection refused".to_string()))
        }
    }

    fn app(limiter: Arc<dyn RateLimiter>) -> Router {
        Router::new()
            .route("/chat", post(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(
                RateLimitState::new(limiter, CHAT_RESOURCE),
                rate_limit_middleware,
            ))
    }

    fn tight_limiter(anonymous_chat: u32) -> Arc<dyn RateLimiter> {
        let mut config = RateLimitConfig::default();
        config.anonymous.chat_per_window = anonymous_chat;
        Arc::new(InMemoryRateLimiter::new(config))
    }

    fn request_from(ip: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("X-Forwarded-For", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn extract_ip_from_x_forwarded_for() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Forwarded-For", "1.2.3.4, 5.6.7.8")
            .body(())
            .unwrap();

        assert_eq!(extract_client_ip(&request, None), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_ip_from_x_real_ip() {
        let request = Request::builder()
            .uri("/test")
            .header("X-Real-IP", "9.8.7.6")
            .body(())
            .unwrap();

        assert_eq!(extract_client_ip(&request, None), Some("9.8.7.6".to_string()));
    }

    #[test]
    fn extract_ip_falls_back_to_connect_info() {
        let request = Request::builder().uri("/test").body(()).unwrap();
        let info = ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 5000)));

        assert_eq!(extract_client_ip(&request, Some(&info)), Some("10.0.0.7".to_string()));
        assert_eq!(extract_client_ip(&request, None), None);
    }

    #[tokio::test]
    async fn allowed_requests_carry_headers() {
        let response = app(tight_limiter(2)).oneshot(request_from("1.1.1.1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "2");
        assert_eq!(response.headers()["x-ratelimit-remaining"], "1");
    }

    #[tokio::test]
    async fn exhausted_budget_is_429_with_retry_after() {
        let app = app(tight_limiter(1));

        let first = app.clone().oneshot(request_from("2.2.2.2")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.clone().oneshot(request_from("2.2.2.2")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key("retry-after"));

        let other_client = app.oneshot(request_from("3.3.3.3")).await.unwrap();
        assert_eq!(other_client.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signed_in_users_are_keyed_by_id() {
        let app = app(tight_limiter(1));
        let mut request = request_from("4.4.4.4");
        request.extensions_mut().insert(AuthenticatedUser::new(
            UserId::new("user-1").unwrap(),
            None,
        ));

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-ratelimit-limit"], "30");

        // The anonymous budget for the same IP is untouched.
        let anonymous = app.oneshot(request_from("4.4.4.4")).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn backend_failure_fails_open() {
        let response = app(Arc::new(BrokenLimiter)).oneshot(request_from("5.5.5.5")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key("x-ratelimit-limit"));
    }
}
