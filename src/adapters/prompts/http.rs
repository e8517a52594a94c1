//! HTTP prompt store.
//!
//! Reads prompts from a prompt management service exposing
//! `GET {base}/api/public/v2/prompts/{name}?label={label}` behind basic auth
//! (public key as user, secret key as password). Text prompts carry the
//! template as a string; chat prompts carry a message list, of which the
//! system messages are joined into one template.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::ports::{PromptStore, PromptStoreError, RemotePrompt};

/// Connection settings for [`HttpPromptStore`].
#[derive(Debug, Clone)]
pub struct HttpPromptStoreConfig {
    pub base_url: String,
    pub public_key: String,
    secret_key: Secret<String>,
    /// Label requested when the caller does not pin one.
    pub default_label: Option<String>,
    pub timeout: Duration,
}

impl HttpPromptStoreConfig {
    pub fn new(
        base_url: impl Into<String>,
        public_key: impl Into<String>,
        secret_key: Secret<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            public_key: public_key.into(),
            secret_key,
            default_label: Some("production".to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_default_label(mut self, label: Option<String>) -> Self {
        self.default_label = label;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct HttpPromptStore {
    config: HttpPromptStoreConfig,
    client: Client,
}

impl HttpPromptStore {
    pub fn new(config: HttpPromptStoreConfig) -> Result<Self, PromptStoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PromptStoreError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn prompt_url(&self, name: &str) -> String {
        format!(
            "{}/api/public/v2/prompts/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(name)
        )
    }
}

/// Wire format of a stored prompt.
#[derive(Debug, Deserialize)]
struct PromptBody {
    name: String,
    version: u32,
    prompt: Value,
    #[serde(default)]
    labels: Vec<String>,
}

/// Extracts template text from a `prompt` field.
fn template_text(name: &str, prompt: &Value) -> Result<String, PromptStoreError> {
    let malformed = |reason: &str| PromptStoreError::Malformed {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let text = match prompt {
        Value::String(text) => text.clone(),
        Value::Array(messages) => messages
            .iter()
            .filter(|m| m.get("role").and_then(Value::as_str) == Some("system"))
            .filter_map(|m| m.get("content").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n\n"),
        _ => return Err(malformed("prompt is neither text nor a message list")),
    };

    if text.trim().is_empty() {
        return Err(malformed("prompt template is empty"));
    }
    Ok(text)
}

fn parse_prompt(
    body: PromptBody,
    requested_label: Option<&str>,
) -> Result<RemotePrompt, PromptStoreError> {
    let template = template_text(&body.name, &body.prompt)?;
    let label = requested_label
        .map(str::to_string)
        .or_else(|| body.labels.first().cloned());
    Ok(RemotePrompt {
        name: body.name,
        template,
        version: body.version,
        label,
    })
}

#[async_trait]
impl PromptStore for HttpPromptStore {
    async fn fetch(
        &self,
        name: &str,
        label: Option<&str>,
    ) -> Result<Option<RemotePrompt>, PromptStoreError> {
        let label = label.or(self.config.default_label.as_deref());
        let mut request = self
            .client
            .get(self.prompt_url(name))
            .basic_auth(&self.config.public_key, Some(self.config.secret_key.expose_secret()));
        if let Some(label) = label {
            request = request.query(&[("label", label)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PromptStoreError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(prompt = name, "Prompt not found in remote store");
                return Ok(None);
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(PromptStoreError::Unauthorized)
            }
            status if !status.is_success() => {
                return Err(PromptStoreError::Unavailable(format!(
                    "prompt store returned {}",
                    status
                )))
            }
            _ => {}
        }

        let body: PromptBody = response.json().await.map_err(|e| PromptStoreError::Malformed {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        parse_prompt(body, label).map(Some)
    }
}

impl std::fmt::Debug for HttpPromptStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPromptStore")
            .field("base_url", &self.config.base_url)
            .field("default_label", &self.config.default_label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(prompt: Value) -> PromptBody {
        serde_json::from_value(json!({
            "name": "funnel/chat",
            "version": 7,
            "prompt": prompt,
            "labels": ["production", "latest"]
        }))
        .unwrap()
    }

    #[test]
    fn text_prompt_is_used_verbatim() {
        let prompt = parse_prompt(body(json!("Hello {{first_name}}")), None).unwrap();
        assert_eq!(prompt.template, "Hello {{first_name}}");
        assert_eq!(prompt.version, 7);
        assert_eq!(prompt.label.as_deref(), Some("production"));
    }

    #[test]
    fn chat_prompt_joins_system_messages() {
        let prompt = parse_prompt(
            body(json!([
                {"role": "system", "content": "Be kind."},
                {"role": "user", "content": "ignored"},
                {"role": "system", "content": "Be brief."}
            ])),
            Some("staging"),
        )
        .unwrap();
        assert_eq!(prompt.template, "Be kind.\n\nBe brief.");
        assert_eq!(prompt.label.as_deref(), Some("staging"));
    }

    #[test]
    fn empty_or_odd_prompts_are_malformed() {
        assert!(matches!(
            parse_prompt(body(json!("   ")), None),
            Err(PromptStoreError::Malformed { .. })
        ));
        assert!(matches!(
            parse_prompt(body(json!(42)), None),
            Err(PromptStoreError::Malformed { .. })
        ));
    }

    #[test]
    fn prompt_names_are_path_encoded() {
        let store = HttpPromptStore::new(HttpPromptStoreConfig::new(
            "https://prompts.example.com/",
            "pk",
            Secret::new("sk".into()),
        ))
        .unwrap();
        assert_eq!(
            store.prompt_url("funnel/chat v2"),
            "https://prompts.example.com/api/public/v2/prompts/funnel%2Fchat%20v2"
        );
    }

    #[tokio::test]
    async fn unreachable_store_is_unavailable() {
        let store = HttpPromptStore::new(
            HttpPromptStoreConfig::new("http://127.0.0.1:9", "pk", Secret::new("sk".into()))
                .with_timeout(Duration::from_millis(500)),
        )
        .unwrap();
        let result = store.fetch("funnel/chat", None).await;
        assert!(matches!(result, Err(PromptStoreError::Unavailable(_))));
    }
}
