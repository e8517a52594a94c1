//! Rate limit configuration types.
//!
//! Two budgets: one for signed-in users and a stricter one for anonymous
//! visitors keyed by IP. Each budget has a limit per rate-limited resource.

use serde::{Deserialize, Serialize};

use crate::config::RateLimitSettings;
use crate::ports::{RateLimitKey, RateLimitScope};

/// Resource name of the conversational endpoint.
pub const CHAT_RESOURCE: &str = "chat";
/// Resource name of the single-shot generation endpoints.
pub const GENERATE_RESOURCE: &str = "generate";

/// Complete rate limit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Fixed window length in seconds.
    pub window_secs: u32,
    /// Budget for callers with a validated bearer token.
    pub authenticated: CallerBudget,
    /// Budget for anonymous callers.
    pub anonymous: CallerBudget,
}

/// Requests allowed per window for one kind of caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerBudget {
    pub chat_per_window: u32,
    pub generate_per_window: u32,
    /// Any other resource.
    pub other_per_window: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            authenticated: CallerBudget::authenticated(),
            anonymous: CallerBudget::anonymous(),
        }
    }
}

impl CallerBudget {
    pub fn authenticated() -> Self {
        Self {
            chat_per_window: 30,
            generate_per_window: 20,
            other_per_window: 120,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            chat_per_window: 10,
            generate_per_window: 6,
            other_per_window: 60,
        }
    }

    pub fn limit_for_resource(&self, resource: &str) -> u32 {
        match resource {
            CHAT_RESOURCE => self.chat_per_window,
            GENERATE_RESOURCE => self.generate_per_window,
            _ => self.other_per_window,
        }
    }
}

impl RateLimitConfig {
    /// Returns (limit, window_secs) for a key.
    pub fn limits_for(&self, key: &RateLimitKey) -> (u32, u32) {
        let budget = match key.scope {
            RateLimitScope::User => &self.authenticated,
            RateLimitScope::Ip => &self.anonymous,
        };
        (budget.limit_for_resource(&key.resource), self.window_secs)
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self {
            window_secs: settings.window_secs,
            authenticated: CallerBudget {
                chat_per_window: settings.authenticated_chat,
                generate_per_window: settings.authenticated_generate,
                ..CallerBudget::authenticated()
            },
            anonymous: CallerBudget {
                chat_per_window: settings.anonymous_chat,
                generate_per_window: settings.anonymous_generate,
                ..CallerBudget::anonymous()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    #[test]
    fn anonymous_budget_is_stricter() {
        let config = RateLimitConfig::default();
        assert!(config.anonymous.chat_per_window < config.authenticated.chat_per_window);
        assert!(config.anonymous.generate_per_window < config.authenticated.generate_per_window);
    }

    #[test]
    fn limits_follow_scope_and_resource() {
        let config = RateLimitConfig::default();
        let user = UserId::new("user-1").unwrap();

        assert_eq!(config.limits_for(&RateLimitKey::ip("1.2.3.4", CHAT_RESOURCE)), (10, 60));
        assert_eq!(config.limits_for(&RateLimitKey::user(&user, CHAT_RESOURCE)), (30, 60));
        assert_eq!(config.limits_for(&RateLimitKey::user(&user, GENERATE_RESOURCE)), (20, 60));
    }

    #[test]
    fn unknown_resource_uses_other_budget() {
        let budget = CallerBudget::anonymous();
        assert_eq!(budget.limit_for_resource("unknown"), 60);
    }

    #[test]
    fn config_serializes_to_json() {
        let json = serde_json::to_string(&RateLimitConfig::default()).unwrap();
        assert!(json.contains("\"window_secs\":60"));
        assert!(json.contains("\"chat_per_window\":10"));
    }

    #[test]
    fn settings_override_budgets() {
        let settings = RateLimitSettings {
            window_secs: 30,
            anonymous_chat: 3,
            ..Default::default()
        };
        let config = RateLimitConfig::from(&settings);

        assert_eq!(config.window_secs, 30);
        assert_eq!(config.anonymous.chat_per_window, 3);
        assert_eq!(config.authenticated, CallerBudget::authenticated());
    }

    #[test]
    fn default_settings_match_default_config() {
        assert_eq!(RateLimitConfig::from(&RateLimitSettings::default()), RateLimitConfig::default());
    }
}
