//! HTTP middleware for axum.
//!
//! - `auth` - Optional bearer authentication and the `OptionalAuth` extractor
//! - `rate_limit` - Per-resource request budgets that fail open

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthState, OptionalAuth};
pub use rate_limit::{rate_limit_middleware, RateLimitState};
