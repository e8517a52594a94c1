//! Rate limit budgets

use serde::Deserialize;

use super::error::ValidationError;

/// Requests allowed per window. Signed-in users get the `authenticated`
/// budget, everyone else is keyed by IP.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RateLimitSettings {
    #[serde(default = "default_window")]
    pub window_secs: u32,
    #[serde(default = "default_auth_chat")]
    pub authenticated_chat: u32,
    #[serde(default = "default_auth_generate")]
    pub authenticated_generate: u32,
    #[serde(default = "default_anon_chat")]
    pub anonymous_chat: u32,
    #[serde(default = "default_anon_generate")]
    pub anonymous_generate: u32,
}

impl RateLimitSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let budgets = [
            self.window_secs,
            self.authenticated_chat,
            self.authenticated_generate,
            self.anonymous_chat,
            self.anonymous_generate,
        ];
        if budgets.contains(&0) {
            return Err(ValidationError::InvalidRateLimit);
        }
        Ok(())
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_secs: default_window(),
            authenticated_chat: default_auth_chat(),
            authenticated_generate: default_auth_generate(),
            anonymous_chat: default_anon_chat(),
            anonymous_generate: default_anon_generate(),
        }
    }
}

fn default_window() -> u32 {
    60
}

fn default_auth_chat() -> u32 {
    30
}

fn default_auth_generate() -> u32 {
    20
}

fn default_anon_chat() -> u32 {
    10
}

fn default_anon_generate() -> u32 {
    6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = RateLimitSettings::default();
        assert_eq!(settings.window_secs, 60);
        assert!(settings.anonymous_chat < settings.authenticated_chat);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let settings = RateLimitSettings {
            anonymous_generate: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(ValidationError::InvalidRateLimit));
    }
}
