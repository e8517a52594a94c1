//! Mock AI Provider for testing and local development.
//!
//! Provides a scripted implementation of the AIProvider port, allowing tests
//! (and servers started without an API key) to run without calling a real model.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Scripted tool calls
//! - Error injection before or during streaming
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response("Hello, I'm the assistant!")
//!     .with_tool_call("show_video", json!({"before_text": "Have a look"}));
//!
//! let mut stream = provider.stream_complete(request).await?;
//! assert_eq!(stream.next().await.unwrap()?.delta, "Hello, ");
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, ChunkStream, CompletionRequest, FinishReason, ProviderInfo, StreamChunk,
    TokenUsage, ToolCall,
};

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    info: ProviderInfo,
    /// Simulated latency per streamed chunk.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success {
        content: String,
        tool_calls: Vec<ToolCall>,
        usage: TokenUsage,
        finish_reason: FinishReason,
    },
    /// Fail before any output.
    Error(AIError),
    /// Stream `partial`, then fail.
    FailMidStream { partial: String, error: AIError },
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1", 128_000).with_tools(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful text response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Success {
            content: content.into(),
            tool_calls: Vec::new(),
            usage: TokenUsage::new(10, 20),
            finish_reason: FinishReason::Stop,
        })
    }

    /// Attaches a tool call to the most recently queued successful response,
    /// or queues a tool-only response if there is none.
    pub fn with_tool_call(self, name: impl Into<String>, input: Value) -> Self {
        {
            let mut responses = lock(&self.responses);
            let call_id = format!("toolu_mock_{}", responses.len());
            let call = ToolCall::new(call_id, name, input);
            match responses.back_mut() {
                Some(MockResponse::Success {
                    tool_calls,
                    finish_reason,
                    ..
                }) => {
                    tool_calls.push(call);
                    *finish_reason = FinishReason::ToolUse;
                }
                _ => responses.push_back(MockResponse::Success {
                    content: String::new(),
                    tool_calls: vec![call],
                    usage: TokenUsage::new(10, 5),
                    finish_reason: FinishReason::ToolUse,
                }),
            }
        }
        self
    }

    /// Adds an error returned before streaming starts.
    pub fn with_error(self, error: AIError) -> Self {
        self.push(MockResponse::Error(error))
    }

    /// Adds a response that streams `partial` and then fails.
    pub fn with_stream_failure(self, partial: impl Into<String>, error: AIError) -> Self {
        self.push(MockResponse::FailMidStream {
            partial: partial.into(),
            error,
        })
    }

    /// Sets simulated latency per streamed chunk.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn push(self, response: MockResponse) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    /// Gets the next response or a default.
    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                content: "Mock response".to_string(),
                tool_calls: Vec::new(),
                usage: TokenUsage::new(5, 10),
                finish_reason: FinishReason::Stop,
            })
    }

    /// Splits content into word chunks for streaming simulation.
    fn word_chunks(content: &str) -> Vec<Result<StreamChunk, AIError>> {
        content
            .split_inclusive(' ')
            .map(|word| Ok(StreamChunk::content(word)))
            .collect()
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        lock(&self.calls).push(request);
        let delay = self.delay;

        let chunks: Vec<Result<StreamChunk, AIError>> = match self.next_response() {
            MockResponse::Success {
                content,
                tool_calls,
                usage,
                finish_reason,
            } => {
                let mut chunks = Self::word_chunks(&content);
                chunks.extend(tool_calls.into_iter().map(|call| Ok(StreamChunk::tool(call))));
                chunks.push(Ok(StreamChunk::final_chunk(finish_reason, usage)));
                chunks
            }
            MockResponse::Error(err) => return Err(err),
            MockResponse::FailMidStream { partial, error } => {
                let mut chunks = Self::word_chunks(&partial);
                chunks.push(Err(error));
                chunks
            }
        };

        let stream = stream::iter(chunks).then(move |chunk| async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            chunk
        });
        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{AgentId, SessionId};
    use crate::ports::{MessageRole, RequestMetadata};
    use serde_json::json;

    fn test_request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(
            SessionId::new(),
            AgentId::new("chat").unwrap(),
            "trace-123",
        ))
        .with_message(MessageRole::User, "Hello")
    }

    async fn collect(provider: &MockAIProvider) -> Vec<Result<StreamChunk, AIError>> {
        provider
            .stream_complete(test_request())
            .await
            .unwrap()
            .collect()
            .await
    }

    fn text_of(chunks: &[Result<StreamChunk, AIError>]) -> String {
        chunks.iter().map(|c| c.as_ref().unwrap().delta.clone()).collect()
    }

    #[tokio::test]
    async fn returns_responses_in_order_then_default() {
        let provider = MockAIProvider::new().with_response("First").with_response("Second");

        assert_eq!(text_of(&collect(&provider).await), "First");
        assert_eq!(text_of(&collect(&provider).await), "Second");
        assert_eq!(text_of(&collect(&provider).await), "Mock response");
    }

    #[tokio::test]
    async fn streaming_reassembles_text_exactly() {
        let provider = MockAIProvider::new().with_response("Hello world from streaming");
        let chunks = collect(&provider).await;

        assert_eq!(text_of(&chunks), "Hello world from streaming");
        assert!(chunks.last().unwrap().as_ref().unwrap().is_final());
    }

    #[tokio::test]
    async fn streaming_emits_tool_calls_before_final_chunk() {
        let provider = MockAIProvider::new()
            .with_response("Here it is.")
            .with_tool_call("show_video", json!({"before_text": "Watch"}));
        let chunks = collect(&provider).await;

        let tool = chunks
            .iter()
            .find_map(|c| c.as_ref().unwrap().tool_call.clone())
            .unwrap();
        assert_eq!(tool.name, "show_video");
        let last = chunks.last().unwrap().as_ref().unwrap();
        assert_eq!(last.finish_reason, Some(FinishReason::ToolUse));
    }

    #[tokio::test]
    async fn error_before_stream() {
        let provider = MockAIProvider::new().with_error(AIError::unavailable("Service down"));
        let result = provider.stream_complete(test_request()).await;
        assert!(matches!(result, Err(AIError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn error_mid_stream() {
        let provider =
            MockAIProvider::new().with_stream_failure("Partial text", AIError::network("reset"));
        let chunks = collect(&provider).await;

        assert!(chunks[0].is_ok());
        assert!(matches!(chunks.last().unwrap(), Err(AIError::Network(_))));
    }

    #[tokio::test]
    async fn tracks_calls() {
        let provider = MockAIProvider::new();
        assert_eq!(provider.call_count(), 0);
        provider.stream_complete(test_request()).await.unwrap();
        provider.stream_complete(test_request()).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls()[0].messages[0].content, "Hello");
    }
}
