//! AdvanceStepHandler - the step progression controller.
//!
//! Accepts a claimed step completion plus an optional answer, merges the
//! answer into the session, moves the pointer and derives completed phases
//! from the new pointer. The write is optimistic and retried on contention.

use std::sync::Arc;

use serde_json::Value;

use super::optimistic::modify_session;
use crate::application::handlers::side_effects::notify_contact_captured;
use crate::domain::flow::{CompletedPhases, FlowRegistry, StepKind};
use crate::domain::foundation::{AgentId, SessionId, SessionStatus};
use crate::domain::session::{answer_patch, ContactUpdate, Session, SessionError};
use crate::ports::{ContactCaptured, ContactNotifier, SessionRepository};

/// Command to record a step completion.
#[derive(Debug, Clone)]
pub struct AdvanceStepCommand {
    pub session_id: SessionId,
    /// Pointer token the client claims to have reached.
    pub step_id: String,
    pub answer: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct AdvanceStepResult {
    pub session: Session,
    pub completed_phases: CompletedPhases,
    /// Agent to call for a relief message, when the step was an AI moment.
    pub relief_agent_id: Option<AgentId>,
}

struct StepOutcome {
    completed_phases: CompletedPhases,
    relief_agent_id: Option<AgentId>,
    contact_captured: bool,
}

pub struct AdvanceStepHandler {
    repository: Arc<dyn SessionRepository>,
    flows: Arc<FlowRegistry>,
    notifier: Arc<dyn ContactNotifier>,
}

impl AdvanceStepHandler {
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

    #[tracing::instrument(skip(self, cmd), fields(session_id = %cmd.session_id, step_id = %cmd.step_id))]
    pub async fn handle(&self, cmd: AdvanceStepCommand) -> Result<AdvanceStepResult, SessionError> {
        let flows = &self.flows;
        let (session, outcome) = modify_session(self.repository.as_ref(), cmd.session_id, |session| {
            apply_step(flows, session, &cmd.step_id, cmd.answer.clone())
        })
        .await?;

        if outcome.contact_captured {
            notify_contact_captured(self.notifier.clone(), ContactCaptured::from_session(&session));
        }

        tracing::info!(
            pointer = session.current_step_id(),
            completed = outcome.completed_phases.count(),
            status = %session.status(),
            "Step recorded"
        );

        Ok(AdvanceStepResult {
            session,
            completed_phases: outcome.completed_phases,
            relief_agent_id: outcome.relief_agent_id,
        })
    }
}

fn apply_step(
    flows: &FlowRegistry,
    session: &mut Session,
    step_id: &str,
    answer: Option<Value>,
) -> Result<StepOutcome, SessionError> {
    let flow = flows
        .get(session.flow_id())
        .ok_or_else(|| SessionError::UnknownFlow(session.flow_id().clone()))?;
    let definition = &flow.definition;
    let located = definition.step(step_id.trim());

    let contact_update = match (located, &answer) {
        (Some((_, step)), Some(answer)) if matches!(step.kind, StepKind::ContactInfo { .. }) => {
            Some(ContactUpdate::from_answer(answer))
        }
        _ => None,
    };

    let patch = answer_patch(located.map(|(_, step)| step), answer)?;
    session.record_step(step_id, patch, &definition.answer_namespaces())?;

    let contact_captured = match contact_update {
        Some(update) if !update.is_empty() => session.update_contact(update)?,
        _ => false,
    };

    if session.stage(definition.phase_count()).is_terminal()
        && session.status() == SessionStatus::Active
    {
        session.transition_to(SessionStatus::Completed)?;
    }

    let relief_agent_id = located.and_then(|(phase, step)| match &step.kind {
        StepKind::AiMoment { agent, .. } => Some(agent.clone().unwrap_or_else(|| {
            flow.agents
                .relief_for_phase(phase.id)
                .map(|a| a.id.clone())
                .unwrap_or_else(|| AgentId::relief_for_phase(phase.id))
        })),
        _ => None,
    });

    Ok(StepOutcome {
        completed_phases: session.completed_phases(definition.phase_count()),
        relief_agent_id,
        contact_captured,
    })
}
