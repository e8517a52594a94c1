//! Application configuration module
//!
//! Configuration is loaded from environment variables with the `FUNNEL`
//! prefix; nested values use a double underscore as separator. A `.env`
//! file is read first when present.
//!
//! # Example
//!
//! ```no_run
//! use funnel_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod auth;
mod database;
mod error;
mod flows;
mod notifications;
mod prompts;
mod rate_limit;
mod redis;
mod server;

pub use ai::AiConfig;
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use flows::FlowsConfig;
pub use notifications::NotificationsConfig;
pub use prompts::PromptsConfig;
pub use rate_limit::RateLimitSettings;
pub use redis::RedisConfig;
pub use server::{Environment, LogFormat, ServerConfig};

use serde::Deserialize;

/// Environment variable prefix, e.g. `FUNNEL__SERVER__PORT`.
pub const ENV_PREFIX: &str = "FUNNEL";

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// development server backed by in-memory stores and the mock model.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; `None` keeps sessions in memory
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Redis; `None` keeps rate limit counters in memory
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub prompts: PromptsConfig,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub flows: FlowsConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `FUNNEL__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `FUNNEL__DATABASE__URL=...` -> `database.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found, section by section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        self.ai.validate(&self.server.environment)?;
        self.prompts.validate()?;
        self.rate_limit.validate()?;
        self.notifications.validate()?;
        self.auth.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "FUNNEL__SERVER__PORT",
        "FUNNEL__SERVER__ENVIRONMENT",
        "FUNNEL__DATABASE__URL",
        "FUNNEL__RATE_LIMIT__ANONYMOUS_CHAT",
        "FUNNEL__PROMPTS__LABEL",
    ];

    fn load_with(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        for (key, value) in vars {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        for key in VARS {
            env::remove_var(key);
        }
        result
    }

    #[test]
    fn test_empty_environment_is_a_dev_server() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
        assert!(config.database.is_none());
        assert!(config.redis.is_none());
        assert!(!config.auth.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_values_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[
            ("FUNNEL__SERVER__PORT", "3000"),
            ("FUNNEL__DATABASE__URL", "postgresql://test@localhost/funnel"),
            ("FUNNEL__RATE_LIMIT__ANONYMOUS_CHAT", "4"),
            ("FUNNEL__PROMPTS__LABEL", "staging"),
        ])
        .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.database.as_ref().map(|d| d.url.as_str()),
            Some("postgresql://test@localhost/funnel")
        );
        assert_eq!(config.rate_limit.anonymous_chat, 4);
        assert_eq!(config.prompts.label, "staging");
    }

    #[test]
    fn test_production_requires_model_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = load_with(&[("FUNNEL__SERVER__ENVIRONMENT", "production")]).unwrap();

        assert!(config.is_production());
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("AI__ANTHROPIC_API_KEY"))
        );
    }
}
