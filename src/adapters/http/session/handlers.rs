//! HTTP handlers for session and step endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{ApiError, ApiJson, ErrorResponse};
use crate::adapters::http::middleware::OptionalAuth;
use crate::application::handlers::session::{
    AdvanceStepCommand, AdvanceStepHandler, CreateSessionCommand, CreateSessionHandler,
    GetSessionHandler, UpdateSessionCommand, UpdateSessionHandler,
};
use crate::domain::foundation::{AccountId, ErrorCode, FlowId, SessionId, SessionStatus, UserId};
use crate::domain::session::ContactUpdate;

use super::dto::{
    AdvanceStepRequest, CreateSessionRequest, SessionCreatedResponse, SessionResponse,
    StepResponse, UpdateSessionRequest,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct SessionHandlers {
    create_handler: Arc<CreateSessionHandler>,
    get_handler: Arc<GetSessionHandler>,
    update_handler: Arc<UpdateSessionHandler>,
    advance_handler: Arc<AdvanceStepHandler>,
}

impl SessionHandlers {
    pub fn new(
        create_handler: Arc<CreateSessionHandler>,
        get_handler: Arc<GetSessionHandler>,
        update_handler: Arc<UpdateSessionHandler>,
        advance_handler: Arc<AdvanceStepHandler>,
    ) -> Self {
        Self {
            create_handler,
            get_handler,
            update_handler,
            advance_handler,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /session - Create a session at the start of a flow
pub async fn create_session(
    State(handlers): State<SessionHandlers>,
    OptionalAuth(user): OptionalAuth,
    ApiJson(req): ApiJson<CreateSessionRequest>,
) -> Result<Response, ApiError> {
    let account_id = required(req.account_id, "accountId")?;
    let flow_id = required(req.flow_id, "flowId")?;

    let cmd = CreateSessionCommand {
        account_id: AccountId::new(account_id).map_err(|e| invalid("accountId", e))?,
        flow_id: FlowId::new(flow_id).map_err(|e| invalid("flowId", e))?,
        user_id: match req.user_id.filter(|u| !u.trim().is_empty()) {
            Some(id) => Some(UserId::new(id).map_err(|e| invalid("userId", e))?),
            None => user.map(|u| u.id),
        },
        context: req.context,
    };

    let session = handlers.create_handler.handle(cmd).await?;
    let response = SessionCreatedResponse {
        session_id: session.id().to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// GET /session/:id - Fetch a session
pub async fn get_session(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let session = handlers.get_handler.handle(session_id).await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// PATCH /session/:id - Update contact details, context or status
pub async fn update_session(
    State(handlers): State<SessionHandlers>,
    Path(session_id): Path<String>,
    ApiJson(req): ApiJson<UpdateSessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let status = req
        .status
        .map(|s| s.parse::<SessionStatus>())
        .transpose()
        .map_err(|e| invalid("status", e))?;

    let cmd = UpdateSessionCommand {
        session_id,
        contact: ContactUpdate {
            first_name: req.first_name,
            email: req.email,
            phone: req.phone,
        },
        context: req.context,
        status,
    };

    let session = handlers.update_handler.handle(cmd).await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// POST /flow/step - Record a step completion
pub async fn advance_step(
    State(handlers): State<SessionHandlers>,
    ApiJson(req): ApiJson<AdvanceStepRequest>,
) -> Result<Json<StepResponse>, ApiError> {
    let session_id = parse_session_id(&required(req.session_id, "sessionId")?)?;
    let step_id = required(req.step_id, "stepId")?;

    let cmd = AdvanceStepCommand {
        session_id,
        step_id,
        answer: req.answer,
    };

    let result = handlers.advance_handler.handle(cmd).await?;
    Ok(Json(StepResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════════════

/// Rejects absent and blank values with a 400 naming the field.
pub(crate) fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::missing_field(field))
}

pub(crate) fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.trim()
        .parse::<SessionId>()
        .map_err(|_| invalid("sessionId", "not a valid session id"))
}

fn invalid(field: &str, reason: impl ToString) -> ApiError {
    ApiError::new(
        StatusCode::BAD_REQUEST,
        ErrorResponse::new(ErrorCode::InvalidFormat, reason.to_string())
            .with_details(serde_json::json!({ "field": field })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_values() {
        assert!(required(None, "stepId").is_err());
        assert!(required(Some("  ".into()), "stepId").is_err());
        assert_eq!(required(Some("phase-1".into()), "stepId").unwrap(), "phase-1");

        let err = required(None, "sessionId").unwrap_err();
        assert_eq!(err.body.code, "EMPTY_FIELD");
    }

    #[test]
    fn session_ids_must_be_uuids() {
        assert!(parse_session_id("not-a-uuid").is_err());
        let id = SessionId::new();
        assert_eq!(parse_session_id(&id.to_string()).unwrap(), id);
    }
}
