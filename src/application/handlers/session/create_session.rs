//! CreateSessionHandler - Command handler for starting a funnel session.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::flow::FlowRegistry;
use crate::domain::foundation::{AccountId, FlowId, SessionId, UserId};
use crate::domain::session::{Session, SessionError};
use crate::ports::SessionRepository;

/// Command to create a new session.
#[derive(Debug, Clone)]
pub struct CreateSessionCommand {
    pub account_id: AccountId,
    pub flow_id: FlowId,
    pub user_id: Option<UserId>,
    /// Seed answers (for example UTM data or prefilled fields).
    pub context: Option<Value>,
}

/// Handler for creating sessions.
pub struct CreateSessionHandler {
    repository: Arc<dyn SessionRepository>,
    flows: Arc<FlowRegistry>,
}

impl CreateSessionHandler {
    pub fn new(repository: Arc<dyn SessionRepository>, flows: Arc<FlowRegistry>) -> Self {
        Self { repository, flows }
    }

    #[tracing::instrument(skip(self, cmd), fields(flow_id = %cmd.flow_id, account_id = %cmd.account_id))]
    pub async fn handle(&self, cmd: CreateSessionCommand) -> Result<Session, SessionError> {
        if self.flows.get(&cmd.flow_id).is_none() {
            return Err(SessionError::UnknownFlow(cmd.flow_id));
        }

        let session = Session::new(
            SessionId::new(),
            cmd.account_id,
            cmd.flow_id,
            cmd.user_id,
            cmd.context,
        )?;

        self.repository.save(&session).await?;
        tracing::info!(session_id = %session.id(), "Session created");

        Ok(session)
    }
}
