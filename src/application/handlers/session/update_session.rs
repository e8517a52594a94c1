//! UpdateSessionHandler - contact, context and status changes outside of step
//! progression.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use super::optimistic::modify_session;
use crate::application::handlers::side_effects::notify_contact_captured;
use crate::domain::flow::FlowRegistry;
use crate::domain::foundation::{SessionId, SessionStatus};
use crate::domain::session::{ContactUpdate, Session, SessionError};
use crate::ports::{ContactCaptured, ContactNotifier, SessionRepository};

#[derive(Debug, Clone, Default)]
pub struct UpdateSessionCommand {
    pub session_id: SessionId,
    pub contact: ContactUpdate,
    /// Object merged into the answers tree.
    pub context: Option<Value>,
    pub status: Option<SessionStatus>,
}

pub struct UpdateSessionHandler {
    repository: Arc<dyn SessionRepository>,
    flows: Arc<FlowRegistry>,
    notifier: Arc<dyn ContactNotifier>,
}

impl UpdateSessionHandler {
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        flows: Arc<FlowRegistry>,
        notifier: Arc<dyn ContactNotifier>,
    ) -> Self {
        Self {
            repository,
            flows,
            notifier,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(session_id = %cmd.session_id))]
    pub async fn handle(&self, cmd: UpdateSessionCommand) -> Result<Session, SessionError> {
        let context = match cmd.context {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => return Err(SessionError::validation("context", "must be an object")),
        };
        let flows = &self.flows;

        let (session, contact_captured) =
            modify_session(self.repository.as_ref(), cmd.session_id, |session| {
                let captured = if cmd.contact.is_empty() {
                    false
                } else {
                    session.update_contact(cmd.contact.clone())?
                };

                if let Some(context) = &context {
                    let namespaces = flows
                        .get(session.flow_id())
                        .map(|flow| flow.definition.answer_namespaces())
                        .unwrap_or_else(BTreeSet::new);
                    session.merge_context(context.clone(), &namespaces);
                }

                if let Some(status) = cmd.status {
                    session.transition_to(status)?;
                }
                Ok(captured)
            })
            .await?;

        if contact_captured {
            notify_contact_captured(self.notifier.clone(), ContactCaptured::from_session(&session));
        }

        Ok(session)
    }
}
