//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, lifecycle status and the error vocabulary
//! used across the funnel engine.

mod auth;
mod errors;
mod ids;
mod session_status;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AccountId, AgentId, FlowId, SessionId, UserId};
pub use session_status::SessionStatus;
pub use timestamp::Timestamp;
