//! Fail-open wrapper around any [`RateLimiter`].
//!
//! Rate limiting protects cost, not correctness. If the backend cannot answer,
//! the request goes through and the failure is logged.

use tracing::warn;

use crate::ports::{RateLimitDenied, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter};

/// Outcome of a fail-open check.
#[derive(Debug, Clone)]
pub enum RateLimitDecision {
    /// Allowed. `None` when the backend was unavailable.
    Allowed(Option<RateLimitStatus>),
    Denied(RateLimitDenied),
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed(_))
    }
}

/// Checks `key`, treating backend errors as allowed.
pub async fn check_fail_open(limiter: &dyn RateLimiter, key: RateLimitKey) -> RateLimitDecision {
    let counter = key.storage_key();
    match limiter.check(key).await {
        Ok(RateLimitResult::Allowed(status)) => RateLimitDecision::Allowed(Some(status)),
        Ok(RateLimitResult::Denied(denied)) => RateLimitDecision::Denied(denied),
        Err(e) => {
            warn!(key = %counter, error = %e, "Rate limiter unavailable, allowing request");
            RateLimitDecision::Allowed(None)
        }
    }
}
