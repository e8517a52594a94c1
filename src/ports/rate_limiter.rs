//! Request budgets for the model-backed endpoints.
//!
//! Every call to `/chat` or `/generate` costs money, so callers get a fixed
//! window budget per resource. Signed-in users are keyed by user id and
//! everyone else by client address.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Timestamp, UserId};

/// Fixed-window counter.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request against `key` and reports whether it fits.
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError>;
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct RateLimitKey {
    pub scope: RateLimitScope,
    /// Client address or user id.
    pub identifier: String,
    pub resource: String,
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    Ip,
    User,
}

impl RateLimitKey {
    pub fn ip(ip: &str, resource: &str) -> Self {
        Self {
            scope: RateLimitScope::Ip,
            identifier: ip.to_string(),
            resource: resource.to_string(),
        }
    }

    pub fn user(user_id: &UserId, resource: &str) -> Self {
        Self {
            scope: RateLimitScope::User,
            identifier: user_id.to_string(),
            resource: resource.to_string(),
        }
    }

    /// Counter name shared by every backend, e.g. `funnel:rl:ip:10.0.0.1:chat`.
    pub fn storage_key(&self) -> String {
        format!("funnel:rl:{}:{}:{}", self.scope, self.identifier, self.resource)
    }
}

impl RateLimitScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Ip => "ip",
            RateLimitScope::User => "user",
        }
    }
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum RateLimitResult {
    Allowed(RateLimitStatus),
    Denied(RateLimitDenied),
}

impl RateLimitResult {
    /// Judges a window in which `count` requests (this one included) landed.
    ///
    /// `resets_in_secs` is the time left in the window; a denied caller is
    /// told to wait at least one second.
    pub fn evaluate(
        scope: RateLimitScope,
        limit: u32,
        count: u64,
        window_secs: u32,
        resets_in_secs: u64,
    ) -> Self {
        let reset_at = Timestamp::from_unix_secs(Timestamp::now().as_unix_secs() + resets_in_secs);
        if count > u64::from(limit) {
            return RateLimitResult::Denied(RateLimitDenied {
                limit,
                retry_after_secs: u32::try_from(resets_in_secs).unwrap_or(window_secs).max(1),
                reset_at,
                scope,
            });
        }
        let used = u32::try_from(count).unwrap_or(limit);
        RateLimitResult::Allowed(RateLimitStatus {
            limit,
            remaining: limit.saturating_sub(used),
            reset_at,
            window_secs,
        })
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed(_))
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: Timestamp,
    pub window_secs: u32,
}

#[derive(Debug, Clone)]
pub struct RateLimitDenied {
    pub limit: u32,
    pub retry_after_secs: u32,
    pub reset_at: Timestamp,
    pub scope: RateLimitScope,
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("rate limiter unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_separates_scope_and_resource() {
        assert_eq!(
            RateLimitKey::ip("10.0.0.1", "chat").storage_key(),
            "funnel:rl:ip:10.0.0.1:chat"
        );
        let user = UserId::new("user-456").unwrap();
        assert_eq!(
            RateLimitKey::user(&user, "generate").storage_key(),
            "funnel:rl:user:user-456:generate"
        );
    }

    #[test]
    fn last_request_inside_budget_leaves_nothing() {
        match RateLimitResult::evaluate(RateLimitScope::Ip, 3, 3, 60, 42) {
            RateLimitResult::Allowed(status) => {
                assert_eq!(status.remaining, 0);
                assert_eq!(status.limit, 3);
            }
            RateLimitResult::Denied(_) => panic!("third of three should pass"),
        }
    }

    #[test]
    fn over_budget_is_denied_with_retry_hint() {
        match RateLimitResult::evaluate(RateLimitScope::User, 3, 4, 60, 0) {
            RateLimitResult::Denied(denied) => {
                assert_eq!(denied.retry_after_secs, 1);
                assert_eq!(denied.scope, RateLimitScope::User);
            }
            RateLimitResult::Allowed(_) => panic!("fourth of three should fail"),
        }
    }
}
