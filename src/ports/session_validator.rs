//! Bearer token validation port.
//!
//! Visitors may stay anonymous. A presented token must verify, and the user
//! id it carries becomes the visitor's rate limit key.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Checks signature and expiry of a raw token (no `Bearer ` prefix).
    ///
    /// Bad signatures and garbage map to `AuthError::InvalidToken`, stale
    /// tokens to `AuthError::TokenExpired`.
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
