//! HTTP routes for streaming conversation endpoints.
//!
//! Each route spends its own rate-limit resource.

use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use crate::adapters::http::middleware::{rate_limit_middleware, RateLimitState};
use crate::adapters::rate_limiter::{CHAT_RESOURCE, GENERATE_RESOURCE};
use crate::ports::RateLimiter;

use super::handlers::{chat, generate, ConversationHandlers};

pub fn conversation_routes(handlers: ConversationHandlers, limiter: Arc<dyn RateLimiter>) -> Router {
    let chat_routes = Router::new()
        .route("/chat", post(chat))
        .route_layer(middleware::from_fn_with_state(
            RateLimitState::new(limiter.clone(), CHAT_RESOURCE),
            rate_limit_middleware,
        ));

    let generate_routes = Router::new()
        .route("/generate/:kind", post(generate))
        .route_layer(middleware::from_fn_with_state(
            RateLimitState::new(limiter, GENERATE_RESOURCE),
            rate_limit_middleware,
        ));

    chat_routes.merge(generate_routes).with_state(handlers)
}
