//! HTTP DTOs for streaming conversation endpoints.

use serde::Deserialize;

use crate::ports::Message;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub session_id: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<Message>,
    #[serde(default)]
    pub prompt_key: Option<String>,
    #[serde(default)]
    pub step_id: Option<String>,
}
