//! Session-specific error types.

use crate::domain::foundation::{
    DomainError, ErrorCode, FlowId, SessionId, SessionStatus, ValidationError,
};

/// Session-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session was not found.
    NotFound(SessionId),
    /// The session's flow is not registered.
    UnknownFlow(FlowId),
    /// Status change not allowed.
    InvalidTransition { from: SessionStatus, to: SessionStatus },
    /// Validation failed.
    ValidationFailed { field: String, message: String },
    /// Another writer updated the session first.
    Conflict(SessionId),
    /// Infrastructure error.
    Infrastructure(String),
}

impl SessionError {
    pub fn not_found(id: SessionId) -> Self {
        SessionError::NotFound(id)
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SessionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        SessionError::Infrastructure(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionError::UnknownFlow(_) => ErrorCode::FlowNotFound,
            SessionError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            SessionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SessionError::Conflict(_) => ErrorCode::ConcurrentModification,
            SessionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn message(&self) -> String {
        match self {
            SessionError::NotFound(id) => format!("Session not found: {}", id),
            SessionError::UnknownFlow(id) => format!("Flow not found: {}", id),
            SessionError::InvalidTransition { from, to } => {
                format!("Cannot change session status from {} to {}", from, to)
            }
            SessionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SessionError::Conflict(id) => {
                format!("Session {} was modified concurrently; retry the request", id)
            }
            SessionError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SessionError {}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { field } => {
                SessionError::validation(field, "cannot be empty")
            }
            ValidationError::InvalidFormat { field, reason } => SessionError::validation(field, reason),
        }
    }
}

impl From<DomainError> for SessionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::InvalidFormat => {
                SessionError::ValidationFailed {
                    field: err.field.unwrap_or_else(|| "unknown".to_string()),
                    message: err.message,
                }
            }
            _ => SessionError::Infrastructure(err.to_string()),
        }
    }
}
