//! Conversation memory port.
//!
//! Memory is optional enrichment. Orchestration recalls a few similar
//! snippets before a model call and remembers the exchange afterwards; every
//! failure here is logged and ignored by callers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{AgentId, SessionId, Timestamp};

/// Port for storing and searching conversation memory.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Returns up to `query.limit` memories of the session most similar to `query.text`.
    async fn recall(&self, query: &MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryStoreError>;

    /// Stores one memory.
    async fn remember(&self, record: MemoryRecord) -> Result<(), MemoryStoreError>;
}

/// Similarity search within one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryQuery {
    pub session_id: SessionId,
    pub text: String,
    pub limit: usize,
}

impl MemoryQuery {
    pub fn new(session_id: SessionId, text: impl Into<String>, limit: usize) -> Self {
        Self {
            session_id,
            text: text.into(),
            limit,
        }
    }
}

/// One remembered exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub session_id: SessionId,
    pub agent_id: AgentId,
    pub content: String,
    pub created_at: Timestamp,
}

impl MemoryRecord {
    pub fn new(session_id: SessionId, agent_id: AgentId, content: impl Into<String>) -> Self {
        Self {
            session_id,
            agent_id,
            content: content.into(),
            created_at: Timestamp::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryStoreError {
    #[error("memory store unavailable: {0}")]
    Unavailable(String),
}
