//! HS256 bearer token validator.
//!
//! Funnel visitors are anonymous by default. When the embedding site signs
//! its users in, it can forward a short-lived HS256 token; the subject claim
//! then keys the visitor's rate limits instead of their IP address.
//!
//! # Example
//!
//! ```ignore
//! use secrecy::Secret;
//! use funnel_engine::adapters::auth::{JwtConfig, JwtSessionValidator};
//!
//! let validator = JwtSessionValidator::new(JwtConfig::new(Secret::new("s3cret".into())));
//! let user = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Configuration for [`JwtSessionValidator`].
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared signing secret.
    pub secret: Secret<String>,
    /// Expected `iss` claim, when the issuer sets one.
    pub issuer: Option<String>,
    /// Expected `aud` claim, when the issuer sets one.
    pub audience: Option<String>,
}

impl JwtConfig {
    pub fn new(secret: Secret<String>) -> Self {
        Self {
            secret,
            issuer: None,
            audience: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

/// Claims read from visitor tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct VisitorClaims {
    /// Subject - the user ID
    pub sub: String,
    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Validates HS256 tokens signed with a shared secret.
pub struct JwtSessionValidator {
    config: JwtConfig,
    key: DecodingKey,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());
        Self { config, key }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &self.config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        validation
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<VisitorClaims>(token, &self.key, &self.validation()).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                _ => {
                    tracing::warn!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            }
        })?;

        let claims = data.claims;
        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Invalid user ID in token: {}", claims.sub);
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(user_id, claims.email))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}
