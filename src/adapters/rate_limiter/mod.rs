//! Rate limiter adapters.
//!
//! Implementations of the RateLimiter port for different backends.
//!
//! ## Available Adapters
//!
//! - `InMemoryRateLimiter` - In-memory for testing and single-server
//! - `RedisRateLimiter` - Redis-backed for production multi-server
//!
//! Callers go through [`check_fail_open`], which lets requests through when
//! the backend is down.
//!
//! ## Usage
//!
//! ```ignore
//! use funnel_engine::adapters::rate_limiter::{
//!     check_fail_open, InMemoryRateLimiter, RateLimitConfig
//! };
//!
//! let limiter = InMemoryRateLimiter::with_defaults();
//! let decision = check_fail_open(&limiter, RateLimitKey::ip("10.0.0.1", CHAT_RESOURCE)).await;
//! ```

mod config;
mod fail_open;
mod in_memory;
mod redis;

pub use config::{CallerBudget, RateLimitConfig, CHAT_RESOURCE, GENERATE_RESOURCE};
pub use fail_open::{check_fail_open, RateLimitDecision};
pub use in_memory::InMemoryRateLimiter;
pub use redis::RedisRateLimiter;
