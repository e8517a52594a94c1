//! Error vocabulary shared by every layer.
//!
//! `ErrorCode` is the stable machine-readable code clients see in error
//! bodies. `DomainError` is what ports return; feature errors convert into it
//! and back.

use std::fmt;
use thiserror::Error;

/// A rejected value object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be empty")]
    EmptyField { field: String },

    #[error("{field} is malformed: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field } | ValidationError::InvalidFormat { field, .. } => {
                field
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Bad input
    ValidationFailed,
    EmptyField,
    InvalidFormat,
    InvalidFlowDefinition,

    // Lookups
    SessionNotFound,
    FlowNotFound,
    StepNotFound,
    AgentNotFound,

    // Session state
    InvalidStateTransition,
    ConcurrentModification,

    Unauthorized,

    // Upstream services
    AIProviderError,
    PromptStoreError,
    RateLimited,

    // Infrastructure
    DatabaseError,
    CacheError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::InvalidFlowDefinition => "INVALID_FLOW_DEFINITION",
            ErrorCode::SessionNotFound => "SESSION_NOT_FOUND",
            ErrorCode::FlowNotFound => "FLOW_NOT_FOUND",
            ErrorCode::StepNotFound => "STEP_NOT_FOUND",
            ErrorCode::AgentNotFound => "AGENT_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::ConcurrentModification => "CONCURRENT_MODIFICATION",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::AIProviderError => "AI_PROVIDER_ERROR",
            ErrorCode::PromptStoreError => "PROMPT_STORE_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::CacheError => "CACHE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned across port boundaries.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    /// Offending input field, for validation codes.
    pub field: Option<String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let code = match &err {
            ValidationError::EmptyField { .. } => ErrorCode::EmptyField,
            ValidationError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
        };
        let field = err.field().to_string();
        DomainError::new(code, err.to_string()).with_field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_field() {
        assert_eq!(
            ValidationError::empty_field("stepId").to_string(),
            "stepId cannot be empty"
        );
        assert_eq!(
            ValidationError::invalid_format("flowId", "too long").to_string(),
            "flowId is malformed: too long"
        );
    }

    #[test]
    fn domain_error_display_leads_with_code() {
        let err = DomainError::new(ErrorCode::SessionNotFound, "no such session");
        assert_eq!(err.to_string(), "[SESSION_NOT_FOUND] no such session");
    }

    #[test]
    fn validation_converts_with_matching_code_and_field() {
        let err: DomainError = ValidationError::invalid_format("accountId", "bad").into();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
        assert_eq!(err.field.as_deref(), Some("accountId"));

        let err: DomainError = ValidationError::empty_field("stepId").into();
        assert_eq!(err.code, ErrorCode::EmptyField);
    }

    #[test]
    fn codes_are_screaming_snake_case() {
        assert_eq!(ErrorCode::AIProviderError.to_string(), "AI_PROVIDER_ERROR");
        assert_eq!(ErrorCode::ConcurrentModification.as_str(), "CONCURRENT_MODIFICATION");
    }
}
