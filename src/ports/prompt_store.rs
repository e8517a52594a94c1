//! Prompt store port.
//!
//! The editable half of every system prompt lives in a remote prompt
//! management service so it can be changed without a deploy. Callers treat
//! this port as best effort: any failure falls back to the agent's built-in
//! prompt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::agents::PromptVersion;

/// Port for fetching editable prompt templates.
#[async_trait]
pub trait PromptStore: Send + Sync {
    /// Fetch the template named `name`, optionally pinned to `label`.
    ///
    /// Returns `Ok(None)` when the store has no such prompt.
    async fn fetch(&self, name: &str, label: Option<&str>) -> Result<Option<RemotePrompt>, PromptStoreError>;
}

/// A prompt template as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePrompt {
    pub name: String,
    /// Template text with `{{variable}}` placeholders.
    pub template: String,
    pub version: u32,
    #[serde(default)]
    pub label: Option<String>,
}

impl RemotePrompt {
    pub fn version_info(&self) -> PromptVersion {
        PromptVersion {
            name: self.name.clone(),
            version: self.version,
            label: self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptStoreError {
    /// Store unreachable or returned a server error.
    #[error("prompt store unavailable: {0}")]
    Unavailable(String),

    #[error("prompt store rejected credentials")]
    Unauthorized,

    /// Response could not be understood.
    #[error("malformed prompt '{name}': {reason}")]
    Malformed { name: String, reason: String },

    /// Remote store is not configured.
    #[error("prompt store not configured")]
    NotConfigured,
}
