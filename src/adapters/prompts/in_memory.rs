//! In-memory prompt store.
//!
//! Used when no remote store is configured (every lookup misses, so agents run
//! on their built-in prompts) and in tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::ports::{PromptStore, PromptStoreError, RemotePrompt};

#[derive(Debug, Clone, Default)]
pub struct InMemoryPromptStore {
    prompts: HashMap<String, RemotePrompt>,
    failure: Option<PromptStoreError>,
}

impl InMemoryPromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, name: &str, template: &str, version: u32) -> Self {
        self.prompts.insert(
            name.to_string(),
            RemotePrompt {
                name: name.to_string(),
                template: template.to_string(),
                version,
                label: None,
            },
        );
        self
    }

    /// Makes every fetch fail with `error`.
    pub fn failing(error: PromptStoreError) -> Self {
        Self {
            prompts: HashMap::new(),
            failure: Some(error),
        }
    }
}

#[async_trait]
impl PromptStore for InMemoryPromptStore {
    async fn fetch(
        &self,
        name: &str,
        label: Option<&str>,
    ) -> Result<Option<RemotePrompt>, PromptStoreError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.prompts.get(name).cloned().map(|mut prompt| {
            prompt.label = label.map(str::to_string);
            prompt
        }))
    }
}
