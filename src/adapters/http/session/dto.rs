//! HTTP DTOs for session and step endpoints.
//!
//! Required fields are `Option` so a missing one produces a 400 naming the
//! field instead of a generic deserialization failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::handlers::AdvanceStepResult;
use crate::domain::foundation::SessionStatus;
use crate::domain::session::{ContactInfo, Session};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub account_id: Option<String>,
    pub flow_id: Option<String>,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub context: Option<Value>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceStepRequest {
    pub session_id: Option<String>,
    pub step_id: Option<String>,
    #[serde(default)]
    pub answer: Option<Value>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreatedResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub flow_id: String,
    pub current_step_id: String,
    pub answers: Value,
    pub contact: ContactResponse,
    pub status: SessionStatus,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactResponse {
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&ContactInfo> for ContactResponse {
    fn from(contact: &ContactInfo) -> Self {
        Self {
            first_name: contact.first_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        }
    }
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            account_id: session.account_id().to_string(),
            user_id: session.user_id().map(|u| u.to_string()),
            flow_id: session.flow_id().to_string(),
            current_step_id: session.current_step_id().to_string(),
            answers: session.answers().clone(),
            contact: session.contact().into(),
            status: session.status(),
            version: session.version(),
            created_at: session.created_at().as_datetime().to_rfc3339(),
            updated_at: session.updated_at().as_datetime().to_rfc3339(),
        }
    }
}

/// Result of a recorded step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub success: bool,
    pub session_id: String,
    pub current_step_id: String,
    pub answers: Value,
    pub completed_phases: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relief_agent_id: Option<String>,
}

impl From<AdvanceStepResult> for StepResponse {
    fn from(result: AdvanceStepResult) -> Self {
        Self {
            success: true,
            session_id: result.session.id().to_string(),
            current_step_id: result.session.current_step_id().to_string(),
            answers: result.session.answers().clone(),
            completed_phases: result.completed_phases.iter().collect(),
            relief_agent_id: result.relief_agent_id.map(|a| a.to_string()),
        }
    }
}
