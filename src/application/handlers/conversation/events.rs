//! Events streamed to the client during a model call.

use futures::Stream;
use serde::Serialize;
use std::pin::Pin;

use crate::domain::embeds::EmbedInvocation;
use crate::domain::foundation::ErrorCode;
use crate::ports::{FinishReason, TokenUsage};

/// One server-sent event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    Text {
        delta: String,
    },
    Tool {
        #[serde(flatten)]
        invocation: EmbedInvocation,
    },
    Done {
        finish_reason: FinishReason,
        usage: TokenUsage,
    },
    Error {
        code: &'static str,
        message: String,
    },
}

impl ConversationEvent {
    pub fn text(delta: impl Into<String>) -> Self {
        ConversationEvent::Text {
            delta: delta.into(),
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ConversationEvent::Error {
            code: code.as_str(),
            message: message.into(),
        }
    }

    /// SSE `event:` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConversationEvent::Text { .. } => "text",
            ConversationEvent::Tool { .. } => "tool",
            ConversationEvent::Done { .. } => "done",
            ConversationEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationEvent::Done { .. } | ConversationEvent::Error { .. })
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = ConversationEvent> + Send>>;
