//! Contact notification configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::ai::is_http_url;
use super::error::ValidationError;

/// Where to post contact-captured events. No URL disables notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    pub contact_webhook_url: Option<String>,

    /// Sent as a bearer token to the webhook
    pub contact_webhook_secret: Option<Secret<String>>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl NotificationsConfig {
    pub fn webhook_url(&self) -> Option<&str> {
        self.contact_webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.webhook_url() {
            Some(url) if !is_http_url(url) => {
                Err(ValidationError::InvalidUrl("NOTIFICATIONS__CONTACT_WEBHOOK_URL"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            contact_webhook_url: None,
            contact_webhook_secret: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
