//! Error responses shared by every endpoint.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::application::handlers::ConversationError;
use crate::domain::flow::FlowError;
use crate::domain::foundation::ErrorCode;
use crate::domain::session::SessionError;

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::EmptyField, format!("Missing required field: {}", field))
            .with_details(serde_json::json!({ "field": field }))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// An error response with its status code.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, body: ErrorResponse) -> Self {
        Self { status, body }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorResponse::bad_request(message))
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorResponse::missing_field(field))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Status code for a domain error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed
        | ErrorCode::EmptyField
        | ErrorCode::InvalidFormat
        | ErrorCode::InvalidStateTransition => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::SessionNotFound
        | ErrorCode::FlowNotFound
        | ErrorCode::StepNotFound
        | ErrorCode::AgentNotFound => StatusCode::NOT_FOUND,
        ErrorCode::ConcurrentModification => StatusCode::CONFLICT,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::AIProviderError => StatusCode::BAD_GATEWAY,
        ErrorCode::InvalidFlowDefinition
        | ErrorCode::PromptStoreError
        | ErrorCode::DatabaseError
        | ErrorCode::CacheError
        | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        let code = error.code();
        if let SessionError::Infrastructure(msg) = &error {
            tracing::error!(error = %msg, "Session persistence failed");
        }
        let mut body = ErrorResponse::new(code, error.message());
        if let SessionError::ValidationFailed { field, .. } = &error {
            body = body.with_details(serde_json::json!({ "field": field }));
        }
        Self::new(status_for(code), body)
    }
}

impl From<FlowError> for ApiError {
    fn from(error: FlowError) -> Self {
        let code = error.code();
        Self::new(status_for(code), ErrorResponse::new(code, error.to_string()))
    }
}

impl From<ConversationError> for ApiError {
    fn from(error: ConversationError) -> Self {
        let code = error.code();
        let message = match &error {
            ConversationError::Upstream(e) => {
                tracing::error!(error = %e, "Model provider failed");
                "The assistant is unavailable right now. Please try again.".to_string()
            }
            ConversationError::Persistence(msg) => {
                tracing::error!(error = %msg, "Conversation persistence failed");
                "Could not load the session.".to_string()
            }
            other => other.to_string(),
        };
        let mut body = ErrorResponse::new(code, message);
        if let ConversationError::Validation { field, .. } = &error {
            body = body.with_details(serde_json::json!({ "field": field }));
        }
        Self::new(status_for(code), body)
    }
}

/// `Json` whose rejections use [`ErrorResponse`] with status 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    let message = match &rejection {
        JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body".to_string(),
        other => other.body_text(),
    };
    ApiError::bad_request(message)
}
