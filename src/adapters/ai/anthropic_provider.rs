//! Anthropic Provider - Implementation of AIProvider for Anthropic's Messages API.
//!
//! Supports streaming completions via SSE, including tool use.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-sonnet-4-20250514")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let provider = AnthropicProvider::new(config)?;
//! ```
//!
//! # Streaming
//!
//! Events arrive as `event:`/`data:` line pairs. Text comes in `text_delta`
//! blocks. Tool calls open with a `tool_use` content block whose arguments
//! are streamed as `input_json_delta` fragments and complete at
//! `content_block_stop`.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, FinishReason, MessageRole, ProviderInfo,
    StreamChunk, TokenUsage, ToolCall,
};

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    api_key: Secret<String>,
    /// Default model, used when a request does not name one.
    pub model: String,
    /// Base URL for the API (default: https://api.anthropic.com).
    pub base_url: String,
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl AnthropicConfig {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Anthropic API provider implementation.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts our request to Anthropic's streaming format.
    fn to_anthropic_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        let mut system = request.system_prompt.clone().unwrap_or_default();
        let mut messages = Vec::new();

        for msg in &request.messages {
            let role = match msg.role {
                MessageRole::System => {
                    // Anthropic takes system text only in the top-level field
                    if !system.is_empty() {
                        system.push_str("\n\n");
                    }
                    system.push_str(&msg.content);
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            messages.push(AnthropicMessage {
                role: role.to_string(),
                content: msg.content.clone(),
            });
        }

        // The first message must come from the user
        if messages.first().map(|m| m.role.as_str()) != Some("user") {
            messages.insert(
                0,
                AnthropicMessage {
                    role: "user".to_string(),
                    content: "Hello".to_string(),
                },
            );
        }

        AnthropicRequest {
            model: request.model.clone().unwrap_or_else(|| self.config.model.clone()),
            messages,
            system: (!system.is_empty()).then_some(system),
            max_tokens: request.max_tokens.unwrap_or(1024),
            temperature: request.temperature,
            tools: request.tools.iter().map(|t| t.to_anthropic_format()).collect(),
            stream: true,
        }
    }

    async fn send_once(&self, body: &AnthropicRequest) -> Result<Response, AIError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })?;

        Self::handle_response_status(response).await
    }

    /// Sends with exponential backoff (1s, 2s, 4s, ...) on retryable errors.
    async fn send_with_retry(&self, body: &AnthropicRequest) -> Result<Response, AIError> {
        let mut retry_count = 0;
        loop {
            match self.send_once(body).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    let delay = Duration::from_secs(1 << retry_count);
                    warn!(error = %err, attempt = retry_count + 1, "Anthropic request failed, retrying");
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(response: Response) -> Result<Response, AIError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&error_body))),
            400 => Err(AIError::InvalidRequest(error_body)),
            // 529 is "overloaded"
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        let message = serde_json::from_str::<Value>(error_body)
            .ok()
            .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string));

        if let Some(msg) = message {
            if let Some(idx) = msg.find("try again in ") {
                let rest = &msg[idx + 13..];
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                if let Ok(secs) = digits.parse::<u32>() {
                    return secs;
                }
            }
        }
        60
    }
}

fn map_stop_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("max_tokens") => FinishReason::Length,
        Some("tool_use") => FinishReason::ToolUse,
        Some("refusal") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

#[async_trait]
impl AIProvider for AnthropicProvider {
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        let body = self.to_anthropic_request(&request);
        debug!(
            model = %body.model,
            tools = body.tools.len(),
            trace_id = %request.metadata.trace_id,
            "Starting Anthropic stream"
        );
        let response = self.send_with_retry(&body).await?;

        let mut parser = SseParser::default();
        let stream = response
            .bytes_stream()
            .map(move |chunk_result| match chunk_result {
                Ok(bytes) => parser.push(&bytes),
                Err(e) => vec![Err(AIError::network(format!("Stream error: {}", e)))],
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("anthropic", &self.config.model, 200_000).with_tools(true)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SSE parsing
// ════════════════════════════════════════════════════════════════════════════

/// Incremental parser for the Messages SSE stream.
///
/// Network chunks split lines (and UTF-8 sequences) arbitrarily, so bytes are
/// buffered until a full line is available.
#[derive(Debug, Default)]
struct SseParser {
    buffer: Vec<u8>,
    pending_tools: HashMap<u32, PendingToolCall>,
    input_tokens: u32,
}

#[derive(Debug)]
struct PendingToolCall {
    id: String,
    name: String,
    partial_json: String,
}

impl SseParser {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk, AIError>> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
            if let Some(data) = line.strip_prefix("data:") {
                self.handle_data(data.trim_start(), &mut out);
            }
        }
        out
    }

    fn handle_data(&mut self, data: &str, out: &mut Vec<Result<StreamChunk, AIError>>) {
        let event = match serde_json::from_str::<StreamEvent>(data) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "Skipping unparseable SSE data");
                return;
            }
        };

        match event {
            StreamEvent::MessageStart { message } => {
                self.input_tokens = message.usage.map(|u| u.input_tokens).unwrap_or(0);
            }
            StreamEvent::ContentBlockStart { index, content_block } => {
                if let ContentBlock::ToolUse { id, name, .. } = content_block {
                    self.pending_tools.insert(
                        index,
                        PendingToolCall {
                            id,
                            name,
                            partial_json: String::new(),
                        },
                    );
                }
            }
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                BlockDelta::TextDelta { text } => {
                    if !text.is_empty() {
                        out.push(Ok(StreamChunk::content(text)));
                    }
                }
                BlockDelta::InputJsonDelta { partial_json } => {
                    if let Some(pending) = self.pending_tools.get_mut(&index) {
                        pending.partial_json.push_str(&partial_json);
                    }
                }
                BlockDelta::Other => {}
            },
            StreamEvent::ContentBlockStop { index } => {
                if let Some(pending) = self.pending_tools.remove(&index) {
                    out.push(pending.finish());
                }
            }
            StreamEvent::MessageDelta { delta, usage } => {
                let output_tokens = usage.map(|u| u.output_tokens).unwrap_or(0);
                out.push(Ok(StreamChunk::final_chunk(
                    map_stop_reason(delta.stop_reason.as_deref()),
                    TokenUsage::new(self.input_tokens, output_tokens),
                )));
            }
            StreamEvent::Error { error } => {
                out.push(Err(AIError::unavailable(
                    error.message.unwrap_or_else(|| "Stream error".to_string()),
                )));
            }
            StreamEvent::Other => {}
        }
    }
}

impl PendingToolCall {
    fn finish(self) -> Result<StreamChunk, AIError> {
        let input = if self.partial_json.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&self.partial_json).map_err(|e| {
                AIError::parse(format!("Invalid arguments for tool '{}': {}", self.name, e))
            })?
        };
        Ok(StreamChunk::tool(ToolCall::new(self.id, self.name, input)))
    }
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Opening of a content block. Only tool blocks need tracking; their input
/// arrives later as `input_json_delta` fragments.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse { id: String, name: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: StreamMessage,
    },
    ContentBlockStart {
        index: u32,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: u32,
        delta: BlockDelta,
    },
    ContentBlockStop {
        index: u32,
    },
    MessageDelta {
        delta: MessageDeltaContent,
        usage: Option<OutputUsage>,
    },
    Error {
        error: StreamErrorContent,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    usage: Option<InputUsage>,
}

#[derive(Debug, Deserialize)]
struct InputUsage {
    input_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OutputUsage {
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta {
        text: String,
    },
    InputJsonDelta {
        partial_json: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaContent {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorContent {
    message: Option<String>,
}
