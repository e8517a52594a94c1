//! Authenticated caller identity.
//!
//! Authentication is optional in the funnel: anonymous visitors are keyed by
//! client address, signed-in users by their subject claim.

use super::UserId;
use thiserror::Error;

/// User extracted from a validated bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(id: UserId, email: Option<String>) -> Self {
        Self { id, email }
    }
}

/// Token validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Token validation is not configured on this server.
    #[error("Authentication is not configured")]
    NotConfigured,
}
