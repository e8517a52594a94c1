//! Contact-captured notification port.
//!
//! Fired when a visitor leaves a reachable email or phone number. Delivery
//! and retry policy belong to the adapter; the caller dispatches the
//! notification on a detached task and only logs failures.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::foundation::{AccountId, FlowId, SessionId, Timestamp};
use crate::domain::session::Session;

#[async_trait]
pub trait ContactNotifier: Send + Sync {
    async fn notify_contact_captured(&self, event: &ContactCaptured) -> Result<(), NotifierError>;
}

/// Payload delivered to the account owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCaptured {
    pub session_id: SessionId,
    pub account_id: AccountId,
    pub flow_id: FlowId,
    pub first_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub captured_at: Timestamp,
}

impl ContactCaptured {
    pub fn from_session(session: &Session) -> Self {
        let contact = session.contact();
        Self {
            session_id: *session.id(),
            account_id: session.account_id().clone(),
            flow_id: session.flow_id().clone(),
            first_name: contact.first_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
            captured_at: Timestamp::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifierError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("notification endpoint rejected the payload with status {0}")]
    Rejected(u16),
}
