//! Redis fixed-window limiter, shared by every server instance.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::ports::{RateLimitError, RateLimitKey, RateLimitResult, RateLimiter};

use super::config::RateLimitConfig;

/// Counts with `INCR` and `TTL` in one atomic pipeline. The window's expiry is
/// set by whichever request finds the counter without one.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: MultiplexedConnection,
    config: RateLimitConfig,
}

impl RedisRateLimiter {
    pub fn new(conn: MultiplexedConnection, config: RateLimitConfig) -> Self {
        Self { conn, config }
    }

    pub async fn connect(url: &str, config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;
        tracing::info!("Connected to Redis for rate limiting");
        Ok(Self::new(conn, config))
    }
}

fn unavailable(e: redis::RedisError) -> RateLimitError {
    RateLimitError::Unavailable(e.to_string())
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
        let counter = key.storage_key();
        let (limit, window_secs) = self.config.limits_for(&key);
        let mut conn = self.conn.clone();

        let (count, ttl): (u64, i64) = redis::pipe()
            .atomic()
            .incr(&counter, 1_u64)
            .ttl(&counter)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        // -1: no expiry yet, so this request opened the window.
        let resets_in = if ttl < 0 {
            conn.expire::<_, ()>(&counter, i64::from(window_secs))
                .await
                .map_err(unavailable)?;
            u64::from(window_secs)
        } else {
            ttl.unsigned_abs()
        };

        Ok(RateLimitResult::evaluate(key.scope, limit, count, window_secs, resets_in))
    }
}

impl std::fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
