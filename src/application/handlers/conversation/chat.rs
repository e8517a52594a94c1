//! ChatHandler - free-form conversation with a flow agent.

use std::sync::Arc;

use super::errors::ConversationError;
use super::events::EventStream;
use super::orchestrator::{load_session_flow, AgentTurn, ConversationOrchestrator};
use crate::domain::embeds::{available_embeds, build_tools};
use crate::domain::flow::FlowRegistry;
use crate::domain::foundation::{AgentId, SessionId};
use crate::ports::{Message, MessageRole, SessionRepository};

#[derive(Debug, Clone)]
pub struct ChatCommand {
    pub session_id: SessionId,
    pub agent_id: AgentId,
    pub messages: Vec<Message>,
}

pub struct ChatHandler {
    sessions: Arc<dyn SessionRepository>,
    flows: Arc<FlowRegistry>,
    orchestrator: Arc<ConversationOrchestrator>,
}

impl ChatHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        flows: Arc<FlowRegistry>,
        orchestrator: Arc<ConversationOrchestrator>,
    ) -> Self {
        Self {
            sessions,
            flows,
            orchestrator,
        }
    }

    #[tracing::instrument(skip(self, cmd), fields(session_id = %cmd.session_id, agent_id = %cmd.agent_id))]
    pub async fn handle(&self, cmd: ChatCommand) -> Result<EventStream, ConversationError> {
        validate_messages(&cmd.messages)?;

        let (session, flow) =
            load_session_flow(self.sessions.as_ref(), &self.flows, cmd.session_id).await?;
        let agent = flow
            .agents
            .get(&cmd.agent_id)
            .cloned()
            .ok_or(ConversationError::AgentNotFound(cmd.agent_id))?;

        let completed = session.completed_phases(flow.definition.phase_count());
        let tools = build_tools(&available_embeds(&completed, &flow.definition.embeds));
        let context = self
            .flows
            .sanitize(session.flow_id(), session.answers(), session.first_name())
            .restricted_to(&agent.context_fields);

        tracing::debug!(completed = completed.count(), tools = tools.len(), "Starting chat turn");

        self.orchestrator
            .run(AgentTurn {
                session,
                flow,
                agent,
                messages: cmd.messages,
                tools,
                context,
            })
            .await
    }
}

fn validate_messages(messages: &[Message]) -> Result<(), ConversationError> {
    let Some(last) = messages.last() else {
        return Err(ConversationError::validation("messages", "cannot be empty"));
    };
    if messages.iter().any(|m| m.role == MessageRole::System) {
        return Err(ConversationError::validation("messages", "system messages are not accepted"));
    }
    if last.role != MessageRole::User || last.content.trim().is_empty() {
        return Err(ConversationError::validation(
            "messages",
            "must end with a non-empty user message",
        ));
    }
    Ok(())
}
