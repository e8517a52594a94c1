//! Webhook contact notifier.
//!
//! Each event is delivered once as `POST {url}` with a JSON body. A shared
//! secret, when configured, travels in the `X-Webhook-Secret` header. Retries
//! are the receiver's business; failures surface to the caller, which only
//! logs them.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::ports::{ContactCaptured, ContactNotifier, NotifierError};

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    secret: Option<Secret<String>>,
    pub timeout: Duration,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_secret(mut self, secret: Option<Secret<String>>) -> Self {
        self.secret = secret;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct WebhookContactNotifier {
    config: WebhookConfig,
    http_client: Client,
}

impl WebhookContactNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, NotifierError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifierError::Delivery(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

#[async_trait]
impl ContactNotifier for WebhookContactNotifier {
    async fn notify_contact_captured(&self, event: &ContactCaptured) -> Result<(), NotifierError> {
        let mut request = self
            .http_client
            .post(&self.config.url)
            .json(&serde_json::json!({
                "type": "contact.captured",
                "data": event,
            }));
        if let Some(secret) = &self.config.secret {
            request = request.header("X-Webhook-Secret", secret.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotifierError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::error!(status, session_id = %event.session_id, "Contact webhook rejected");
            return Err(NotifierError::Rejected(status));
        }

        tracing::debug!(session_id = %event.session_id, "Contact webhook delivered");
        Ok(())
    }
}

impl std::fmt::Debug for WebhookContactNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookContactNotifier")
            .field("url", &self.config.url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopContactNotifier;

#[async_trait]
impl ContactNotifier for NoopContactNotifier {
    async fn notify_contact_captured(&self, event: &ContactCaptured) -> Result<(), NotifierError> {
        tracing::debug!(session_id = %event.session_id, "No contact webhook configured; dropping event");
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingContactNotifier {
    events: Arc<RwLock<Vec<ContactCaptured>>>,
}

impl RecordingContactNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<ContactCaptured> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl ContactNotifier for RecordingContactNotifier {
    async fn notify_contact_captured(&self, event: &ContactCaptured) -> Result<(), NotifierError> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
