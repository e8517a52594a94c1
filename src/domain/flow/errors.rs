//! Flow definition errors.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, FlowId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("flow not found: {0}")]
    NotFound(FlowId),

    #[error("could not parse flow definition '{source_name}': {message}")]
    Parse { source_name: String, message: String },

    #[error("invalid flow '{flow}': {reason}")]
    Invalid { flow: String, reason: String },

    #[error("duplicate flow id '{0}'")]
    Duplicate(FlowId),

    #[error("could not read flow files: {0}")]
    Io(String),
}

impl FlowError {
    pub fn invalid(flow: impl ToString, reason: impl Into<String>) -> Self {
        FlowError::Invalid {
            flow: flow.to_string(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            FlowError::NotFound(_) => ErrorCode::FlowNotFound,
            FlowError::Parse { .. } | FlowError::Invalid { .. } | FlowError::Duplicate(_) => {
                ErrorCode::InvalidFlowDefinition
            }
            FlowError::Io(_) => ErrorCode::InternalError,
        }
    }
}

impl From<FlowError> for DomainError {
    fn from(err: FlowError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
