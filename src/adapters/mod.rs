//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Anthropic streaming provider and a scripted mock
//! - `auth` - JWT bearer validation
//! - `http` - axum routers, middleware and error mapping
//! - `notifications` - Contact-captured webhook
//! - `postgres` - sqlx session and memory stores
//! - `prompts` - Remote prompt store with TTL cache
//! - `rate_limiter` - Redis and in-memory fixed-window limiters
//! - `storage` - In-memory session and memory stores
//! - `telemetry` - Generation trace sinks

pub mod ai;
pub mod auth;
pub mod http;
pub mod notifications;
pub mod postgres;
pub mod prompts;
pub mod rate_limiter;
pub mod storage;
pub mod telemetry;
