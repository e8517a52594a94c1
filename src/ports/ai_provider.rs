//! Model provider port.
//!
//! Every agent call goes through [`AIProvider`]. The orchestrator consumes a
//! [`ChunkStream`] of text deltas and [`ToolCall`]s and never sees which vendor
//! produced them. Embed tools are offered per request.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

use crate::domain::embeds::ToolDefinition;
use crate::domain::foundation::{AgentId, SessionId, UserId};

/// Boxed stream of provider chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, AIError>> + Send>>;

#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Generate a streaming completion.
    ///
    /// Errors returned here happen before any output was produced. Errors
    /// yielded by the stream happen mid-generation.
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError>;

    /// Get provider information (name, default model, capabilities).
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for AI completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Conversation messages (history + current user message).
    pub messages: Vec<Message>,
    /// System prompt to guide model behavior.
    pub system_prompt: Option<String>,
    /// Model override. `None` uses the provider default.
    pub model: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Temperature for response randomness.
    pub temperature: Option<f32>,
    /// Tools the model may invoke.
    pub tools: Vec<ToolDefinition>,
    /// Request metadata for tracing.
    pub metadata: RequestMetadata,
}

impl CompletionRequest {
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            model: None,
            max_tokens: None,
            temperature: None,
            tools: Vec::new(),
            metadata,
        }
    }

    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions. Providers fold these into the system prompt.
    System,
    User,
    Assistant,
}

/// Request metadata for tracing.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub session_id: SessionId,
    pub agent_id: AgentId,
    /// Signed-in user, if any.
    pub user_id: Option<UserId>,
    /// Trace ID shared by the model call and its trace record.
    pub trace_id: String,
}

impl RequestMetadata {
    pub fn new(session_id: SessionId, agent_id: AgentId, trace_id: impl Into<String>) -> Self {
        Self {
            session_id,
            agent_id,
            user_id: None,
            trace_id: trace_id.into(),
        }
    }

    pub fn with_user(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned call id.
    pub id: String,
    pub name: String,
    /// Arguments as parsed JSON.
    pub input: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop (end of response).
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// Stopped to let the caller run a tool.
    ToolUse,
    /// Content was filtered for safety.
    ContentFilter,
    Error,
}

/// Streaming chunk from AI completion.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamChunk {
    /// New text in this chunk.
    pub delta: String,
    /// Completed tool invocation, if this chunk carries one.
    pub tool_call: Option<ToolCall>,
    /// If present, generation is complete.
    pub finish_reason: Option<FinishReason>,
    /// Token usage (only present on final chunk).
    pub usage: Option<TokenUsage>,
}

impl StreamChunk {
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            delta: delta.into(),
            tool_call: None,
            finish_reason: None,
            usage: None,
        }
    }

    pub fn tool(call: ToolCall) -> Self {
        Self {
            delta: String::new(),
            tool_call: Some(call),
            finish_reason: None,
            usage: None,
        }
    }

    pub fn final_chunk(finish_reason: FinishReason, usage: TokenUsage) -> Self {
        Self {
            delta: String::new(),
            tool_call: None,
            finish_reason: Some(finish_reason),
            usage: Some(usage),
        }
    }

    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// Provider information and capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "anthropic").
    pub name: String,
    /// Default model identifier.
    pub model: String,
    pub max_context_tokens: u32,
    pub supports_tools: bool,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>, max_context_tokens: u32) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            max_context_tokens,
            supports_tools: false,
        }
    }

    pub fn with_tools(mut self, supports: bool) -> Self {
        self.supports_tools = supports;
        self
    }
}

/// AI provider errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AIError {
    /// HTTP 429 from the vendor.
    #[error("provider rate limit hit, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Overloaded or 5xx.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("network error: {0}")]
    Network(String),

    /// Unreadable response or stream frame.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl AIError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_metadata() -> RequestMetadata {
        RequestMetadata::new(SessionId::new(), AgentId::new("chat").unwrap(), "trace-123")
    }

    #[test]
    fn completion_request_builder_works() {
        let tool = ToolDefinition::new("show_video", "Show a video", json!({"type": "object"}));
        let request = CompletionRequest::new(test_metadata())
            .with_message(MessageRole::User, "Hello")
            .with_system_prompt("Be helpful")
            .with_model(Some("claude-test".to_string()))
            .with_max_tokens(100)
            .with_temperature(0.7)
            .with_tools(vec![tool]);

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.system_prompt.as_deref(), Some("Be helpful"));
        assert_eq!(request.model.as_deref(), Some("claude-test"));
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.tools.len(), 1);
    }

    #[test]
    fn metadata_carries_optional_user() {
        let meta = test_metadata().with_user(Some(UserId::new("user-1").unwrap()));
        assert_eq!(meta.user_id.unwrap().as_str(), "user-1");
        assert_eq!(meta.agent_id.as_str(), "chat");
    }

    #[test]
    fn usage_totals_both_directions() {
        assert_eq!(TokenUsage::new(1_200, 340).total_tokens, 1_540);
        assert_eq!(TokenUsage::zero(), TokenUsage::default());
    }

    #[test]
    fn stream_chunk_kinds() {
        let text = StreamChunk::content("Hello");
        assert!(!text.is_final());
        assert!(text.tool_call.is_none());

        let tool = StreamChunk::tool(ToolCall::new("t1", "show_video", json!({"before_text": "Look"})));
        assert!(!tool.is_final());
        assert_eq!(tool.tool_call.as_ref().unwrap().name, "show_video");

        let last = StreamChunk::final_chunk(FinishReason::Stop, TokenUsage::new(10, 5));
        assert!(last.is_final());
        assert_eq!(last.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn only_transient_errors_retry() {
        let transient = [
            AIError::rate_limited(30),
            AIError::unavailable("overloaded"),
            AIError::network("connection reset"),
            AIError::Timeout { timeout_secs: 60 },
        ];
        assert!(transient.iter().all(AIError::is_retryable));

        let permanent = [
            AIError::AuthenticationFailed,
            AIError::parse("bad json"),
            AIError::InvalidRequest("max_tokens".into()),
        ];
        assert!(!permanent.iter().any(AIError::is_retryable));
    }

    #[test]
    fn serde_casing() {
        assert_eq!(serde_json::to_string(&MessageRole::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&FinishReason::ToolUse).unwrap(), "\"tool_use\"");
    }

    #[test]
    fn rate_limit_message_carries_delay() {
        assert_eq!(
            AIError::rate_limited(30).to_string(),
            "provider rate limit hit, retry in 30s"
        );
    }
}
