//! Remote prompt store configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::ai::is_http_url;
use super::error::ValidationError;

/// Settings for the remote prompt management service.
///
/// All fields are optional; without `base_url` agents use their bundled
/// fallback prompts.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptsConfig {
    pub base_url: Option<String>,
    pub public_key: Option<String>,
    pub secret_key: Option<Secret<String>>,

    /// Prompt label to request, e.g. `production`
    #[serde(default = "default_label")]
    pub label: String,

    /// How long a fetched prompt is served from cache
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl PromptsConfig {
    pub fn is_remote(&self) -> bool {
        self.base_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Ok(());
        };
        if !is_http_url(url) {
            return Err(ValidationError::InvalidUrl("PROMPTS__BASE_URL"));
        }
        if self.public_key.as_deref().map_or(true, str::is_empty) {
            return Err(ValidationError::MissingRequired("PROMPTS__PUBLIC_KEY"));
        }
        if self.secret_key.is_none() {
            return Err(ValidationError::MissingRequired("PROMPTS__SECRET_KEY"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            public_key: None,
            secret_key: None,
            label: default_label(),
            cache_ttl_secs: default_cache_ttl(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_label() -> String {
    "production".to_string()
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_prompts_need_nothing() {
        let config = PromptsConfig::default();
        assert!(!config.is_remote());
        assert!(config.validate().is_ok());
        assert_eq!(config.label, "production");
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_remote_prompts_need_credentials() {
        let mut config = PromptsConfig {
            base_url: Some("https://prompts.example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PROMPTS__PUBLIC_KEY"))
        );

        config.public_key = Some("pk-123".to_string());
        config.secret_key = Some(Secret::new("sk-123".to_string()));
        assert!(config.is_remote());
        assert!(config.validate().is_ok());
    }
}
