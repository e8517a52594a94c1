//! Process-local fixed-window limiter for development and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::Timestamp;
use crate::ports::{RateLimitError, RateLimitKey, RateLimitResult, RateLimiter};

use super::config::RateLimitConfig;

/// Counters live in one map; each server instance counts on its own.
#[derive(Debug, Clone)]
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    opened_at: u64,
    count: u64,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let (limit, window_secs) = self.config.limits_for(&key);
        let now = Timestamp::now().as_unix_secs();
        let length = u64::from(window_secs);

        let mut windows = self.windows.lock().await;
        let window = windows.entry(key.storage_key()).or_insert(Window {
            opened_at: now,
            count: 0,
        });
        if now >= window.opened_at + length {
            *window = Window {
                opened_at: now,
                count: 0,
            };
        }
        window.count += 1;

        let resets_in = (window.opened_at + length).saturating_sub(now);
        Ok(RateLimitResult::evaluate(key.scope, limit, window.count, window_secs, resets_in))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rate_limiter::config::{CHAT_RESOURCE, GENERATE_RESOURCE};
    use crate::domain::foundation::UserId;
    use crate::ports::RateLimitScope;

    fn tight_config(anonymous_chat: u32) -> RateLimitConfig {
        let mut config = RateLimitConfig::default();
        config.anonymous.chat_per_window = anonymous_chat;
        config
    }

    #[tokio::test]
    async fn allows_requests_within_limit() {
        let limiter = InMemoryRateLimiter::with_defaults();
        let key = RateLimitKey::ip("192.168.1.1", CHAT_RESOURCE);

        for i in 0..10 {
            let result = limiter.check(key.clone()).await.unwrap();
            assert!(result.is_allowed(), "request {} rejected", i + 1);
        }
    }

    #[tokio::test]
    async fn denies_requests_at_limit() {
        let limiter = InMemoryRateLimiter::new(tight_config(5));
        let key = RateLimitKey::ip("192.168.1.1", CHAT_RESOURCE);

        for _ in 0..5 {
            assert!(limiter.check(key.clone()).await.unwrap().is_allowed());
        }

        let result = limiter.check(key.clone()).await.unwrap();
        match result {
            RateLimitResult::Denied(denied) => {
                assert_eq!(denied.limit, 5);
                assert!(denied.retry_after_secs > 0);
                assert!(denied.retry_after_secs <= 60);
                assert_eq!(denied.scope, RateLimitScope::Ip);
            }
            RateLimitResult::Allowed(_) => panic!("sixth request should be denied"),
        }
    }

    #[tokio::test]
    async fn authenticated_users_get_larger_budget() {
        let limiter = InMemoryRateLimiter::with_defaults();
        let user = UserId::new("user-1").unwrap();

        let anon = limiter.check(RateLimitKey::ip("1.1.1.1", CHAT_RESOURCE)).await.unwrap();
        let authed = limiter.check(RateLimitKey::user(&user, CHAT_RESOURCE)).await.unwrap();

        match (anon, authed) {
            (RateLimitResult::Allowed(a), RateLimitResult::Allowed(u)) => assert!(a.limit < u.limit),
            _ => panic!("first requests should be allowed"),
        }
    }

    #[tokio::test]
    async fn different_ips_have_independent_limits() {
        let limiter = InMemoryRateLimiter::new(tight_config(3));
        let key1 = RateLimitKey::ip("1.1.1.1", CHAT_RESOURCE);
        let key2 = RateLimitKey::ip("2.2.2.2", CHAT_RESOURCE);

        for _ in 0..3 {
            limiter.check(key1.clone()).await.unwrap();
        }
        assert!(!limiter.check(key1).await.unwrap().is_allowed());
        assert!(limiter.check(key2).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn resources_are_counted_separately() {
        let limiter = InMemoryRateLimiter::new(tight_config(1));
        limiter.check(RateLimitKey::ip("1.1.1.1", CHAT_RESOURCE)).await.unwrap();

        let generate = limiter
            .check(RateLimitKey::ip("1.1.1.1", GENERATE_RESOURCE))
            .await
            .unwrap();
        assert!(generate.is_allowed());
    }

    #[tokio::test]
    async fn remaining_decrements_correctly() {
        let limiter = InMemoryRateLimiter::new(tight_config(10));
        let key = RateLimitKey::ip("test-ip", CHAT_RESOURCE);

        for expected_remaining in (0..10u32).rev() {
            match limiter.check(key.clone()).await.unwrap() {
                RateLimitResult::Allowed(status) => assert_eq!(status.remaining, expected_remaining),
                RateLimitResult::Denied(_) => panic!("should be within limit"),
            }
        }
    }
}
