//! HTTP adapters - REST and SSE endpoints.
//!
//! Each feature has its own router; `app_router` merges them with the shared
//! tower-http layers.

mod app;
pub mod conversation;
pub mod error;
pub mod flow;
pub mod middleware;
pub mod session;

pub use app::{app_router, health, AppState, HttpOptions};
pub use error::{ApiError, ApiJson, ErrorResponse};
