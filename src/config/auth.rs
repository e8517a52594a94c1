//! Authentication configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Optional HS256 bearer authentication.
///
/// Without a secret every caller is anonymous.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: Option<Secret<String>>,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
}

impl AuthConfig {
    pub fn is_enabled(&self) -> bool {
        self.jwt_secret.is_some()
    }

    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.jwt_secret {
            Some(secret) if secret.expose_secret().len() < 32 => Err(ValidationError::WeakJwtSecret),
            _ => Ok(()),
        }
    }
}
