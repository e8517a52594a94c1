//! Generation trace port.
//!
//! One trace per model call: which agent, which prompt version, how long it
//! took and what it cost. Recorded from a detached task after the stream ends.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::ai_provider::{FinishReason, TokenUsage};
use crate::domain::agents::{PromptSource, PromptVersion};
use crate::domain::foundation::{AgentId, SessionId};

#[async_trait]
pub trait TraceSink: Send + Sync {
    async fn record(&self, trace: GenerationTrace) -> Result<(), TraceError>;
}

/// Observability record of one model call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationTrace {
    pub trace_id: String,
    pub session_id: SessionId,
    pub agent_id: AgentId,
    pub model: String,
    pub prompt_source: PromptSource,
    pub prompt_version: Option<PromptVersion>,
    pub latency_ms: u64,
    pub usage: TokenUsage,
    pub finish_reason: FinishReason,
    /// Names of tools the model invoked.
    pub tool_calls: Vec<String>,
    /// Length of the generated text in characters.
    pub output_chars: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    #[error("trace sink unavailable: {0}")]
    Unavailable(String),
}
