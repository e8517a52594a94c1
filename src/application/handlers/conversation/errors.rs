//! Conversation errors.

use thiserror::Error;

use crate::domain::foundation::{AgentId, DomainError, ErrorCode, FlowId, SessionId};
use crate::ports::AIError;

/// Failures that stop a model call before any output is streamed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversationError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("flow not found: {0}")]
    FlowNotFound(FlowId),

    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("unknown generation type '{0}'")]
    UnknownGenerationType(String),

    #[error("model call failed: {0}")]
    Upstream(AIError),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ConversationError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConversationError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConversationError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            ConversationError::FlowNotFound(_) => ErrorCode::FlowNotFound,
            ConversationError::AgentNotFound(_) => ErrorCode::AgentNotFound,
            ConversationError::Validation { .. } | ConversationError::UnknownGenerationType(_) => {
                ErrorCode::ValidationFailed
            }
            ConversationError::Upstream(_) => ErrorCode::AIProviderError,
            ConversationError::Persistence(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<DomainError> for ConversationError {
    fn from(err: DomainError) -> Self {
        ConversationError::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_variants() {
        assert_eq!(
            ConversationError::UnknownGenerationType("poem".into()).code(),
            ErrorCode::ValidationFailed
        );
        assert_eq!(
            ConversationError::Upstream(AIError::AuthenticationFailed).code(),
            ErrorCode::AIProviderError
        );
        let err: ConversationError = DomainError::database("down").into();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }
}
