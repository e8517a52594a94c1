//! Optional bearer authentication for axum.
//!
//! Funnel visitors are anonymous by default. When a validator is configured,
//! `auth_middleware` validates any `Authorization: Bearer` token and injects
//! the [`AuthenticatedUser`] into request extensions, where rate limiting and
//! session creation pick it up.
//!
//! ```text
//! Request → auth_middleware → AuthenticatedUser in extensions (if token valid)
//!                                      ↓
//!            rate_limit_middleware / OptionalAuth extractor
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::ErrorResponse;
use crate::domain::foundation::{AuthError, AuthenticatedUser, ErrorCode};
use crate::ports::SessionValidator;

/// Auth middleware state - wraps the session validator.
pub type AuthState = Arc<dyn SessionValidator>;

/// Validates a bearer token when one is present.
///
/// Requests without a token pass through untouched. A token that fails
/// validation is rejected with 401 rather than silently downgraded to
/// anonymous, so clients notice expired credentials.
pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return next.run(request).await;
    };

    match validator.validate(&token).await {
        Ok(user) => {
            tracing::debug!(user_id = %user.id, "Bearer token accepted");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            let message = match e {
                AuthError::TokenExpired => "Token expired",
                AuthError::InvalidToken => "Invalid token",
                AuthError::NotConfigured => "Authentication is not configured",
            };
            tracing::debug!(error = %e, "Bearer token rejected");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(ErrorCode::Unauthorized, message)),
            )
                .into_response()
        }
    }
}

fn bearer_token<B>(request: &axum::http::Request<B>) -> Option<String> {
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Extractor for optional authentication.
///
/// Returns `None` if no valid token was provided, `Some(user)` otherwise.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user = parts.extensions.get::<AuthenticatedUser>().cloned();
            Ok(OptionalAuth(user))
        })
    }
}
