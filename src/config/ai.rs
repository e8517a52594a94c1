//! Model provider settings (`FUNNEL__AI__*`).
//!
//! Without an API key the server talks to the scripted mock provider, which
//! production refuses to start with.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub anthropic_api_key: Option<Secret<String>>,
    /// Used by agents that do not pin a model.
    pub default_model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Extra attempts on 429, 5xx and connection errors.
    pub max_retries: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            default_model: None,
            base_url: None,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API key, ignoring blank values.
    pub fn anthropic_key(&self) -> Option<&Secret<String>> {
        self.anthropic_api_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
    }

    pub fn has_anthropic(&self) -> bool {
        self.anthropic_key().is_some()
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if *environment == Environment::Production && !self.has_anthropic() {
            return Err(ValidationError::MissingRequired("AI__ANTHROPIC_API_KEY"));
        }
        match &self.base_url {
            Some(url) if !is_http_url(url) => Err(ValidationError::InvalidUrl("AI__BASE_URL")),
            _ if self.timeout_secs == 0 => Err(ValidationError::InvalidTimeout),
            _ => Ok(()),
        }
    }
}

pub(super) fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}
