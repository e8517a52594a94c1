use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A loaded value that the server refuses to start with.
///
/// Names in messages are the env var suffix after `FUNNEL__`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingRequired(&'static str),

    #[error("SERVER__PORT must be non-zero")]
    InvalidPort,

    #[error("cannot bind to {0}")]
    InvalidBindAddress(String),

    #[error("SERVER__REQUEST_TIMEOUT_SECS must be between 1 and 300")]
    InvalidTimeout,

    #[error("DATABASE__URL must be a postgres:// or postgresql:// URL")]
    InvalidDatabaseUrl,

    #[error("REDIS__URL must be a redis:// or rediss:// URL")]
    InvalidRedisUrl,

    #[error("DATABASE__MIN_CONNECTIONS exceeds DATABASE__MAX_CONNECTIONS")]
    InvalidPoolSize,

    #[error("DATABASE__MAX_CONNECTIONS is capped at 100")]
    PoolSizeTooLarge,

    #[error("{0} must be an http(s) URL")]
    InvalidUrl(&'static str),

    #[error("rate limit window and budgets must be positive")]
    InvalidRateLimit,

    #[error("AUTH__JWT_SECRET must be at least 32 bytes")]
    WeakJwtSecret,

    #[error("{0} must use https in production")]
    MustBeHttps(&'static str),
}
