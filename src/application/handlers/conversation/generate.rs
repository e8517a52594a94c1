//! GenerateHandler - one-shot generations (relief, diagnosis, personalized
//! questions, qualification).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::errors::ConversationError;
use super::events::EventStream;
use super::orchestrator::{load_session_flow, AgentTurn, ConversationOrchestrator};
use crate::domain::agents::{AgentConfig, AgentPurpose};
use crate::domain::embeds::{build_tools, configured_embeds, ToolSet};
use crate::domain::flow::{FlowRegistry, RegisteredFlow, Step, StepKind};
use crate::domain::foundation::{AgentId, SessionId};
use crate::domain::session::Session;
use crate::ports::{Message, MessageRole, SessionRepository};

/// Kinds of one-shot generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateKind {
    Relief,
    Diagnosis,
    Personalize,
    Qualification,
}

impl GenerateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerateKind::Relief => "relief",
            GenerateKind::Diagnosis => "diagnosis",
            GenerateKind::Personalize => "personalize",
            GenerateKind::Qualification => "qualification",
        }
    }

    /// Only these kinds may be offered the qualification embed.
    fn offers_qualified_embed(&self) -> bool {
        matches!(self, GenerateKind::Diagnosis | GenerateKind::Qualification)
    }
}

impl fmt::Display for GenerateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerateKind {
    type Err = ConversationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relief" => Ok(GenerateKind::Relief),
            "diagnosis" => Ok(GenerateKind::Diagnosis),
            "personalize" => Ok(GenerateKind::Personalize),
            "qualification" => Ok(GenerateKind::Qualification),
            other => Err(ConversationError::UnknownGenerationType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateCommand {
    pub session_id: SessionId,
    pub kind: GenerateKind,
    pub conversation_history: Vec<Message>,
    /// Registered agent id, or a prompt name overriding the kind's agent.
    pub prompt_key: Option<String>,
    /// Question to personalize. Defaults to the first personalizable
    /// question of the current phase.
    pub step_id: Option<String>,
}

pub struct GenerateHandler {
    sessions: Arc<dyn SessionRepository>,
    flows: Arc<FlowRegistry>,
    orchestrator: Arc<ConversationOrchestrator>,
}

impl GenerateHandler {
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

    #[tracing::instrument(skip(self, cmd), fields(session_id = %cmd.session_id, kind = %cmd.kind))]
    pub async fn handle(&self, cmd: GenerateCommand) -> Result<EventStream, ConversationError> {
        let (session, flow) =
            load_session_flow(self.sessions.as_ref(), &self.flows, cmd.session_id).await?;

        let agent = select_agent(&flow, &session, cmd.kind, cmd.prompt_key.as_deref())?;
        let tools = qualified_tools(&flow, &session, cmd.kind);
        let messages = with_kickoff(&flow, &session, &cmd)?;
        let context = self
            .flows
            .sanitize(session.flow_id(), session.answers(), session.first_name())
            .restricted_to(&agent.context_fields);

        tracing::debug!(agent_id = %agent.id, tools = tools.len(), "Starting generation");

        self.orchestrator
            .run(AgentTurn {
                session,
                flow,
                agent,
                messages,
                tools,
                context,
            })
            .await
    }
}

fn select_agent(
    flow: &RegisteredFlow,
    session: &Session,
    kind: GenerateKind,
    prompt_key: Option<&str>,
) -> Result<AgentConfig, ConversationError> {
    let prompt_key = prompt_key.map(str::trim).filter(|k| !k.is_empty());

    if let Some(agent) = prompt_key
        .and_then(|key| AgentId::new(key).ok())
        .and_then(|id| flow.agents.get(&id))
    {
        return Ok(agent.clone());
    }

    let agent = match kind {
        GenerateKind::Relief => {
            let phase = session
                .completed_phases(flow.definition.phase_count())
                .highest()
                .unwrap_or(1);
            flow.agents
                .relief_for_phase(phase)
                .ok_or_else(|| ConversationError::AgentNotFound(AgentId::relief_for_phase(phase)))?
        }
        GenerateKind::Diagnosis => by_purpose(flow, AgentPurpose::Diagnosis, "diagnosis")?,
        GenerateKind::Personalize => by_purpose(flow, AgentPurpose::Personalization, "personalize")?,
        GenerateKind::Qualification => {
            by_purpose(flow, AgentPurpose::Qualification, "qualification")?
        }
    };

    let mut agent = agent.clone();
    if let Some(key) = prompt_key {
        agent.prompt_name = Some(key.to_string());
    }
    Ok(agent)
}

fn by_purpose<'a>(
    flow: &'a RegisteredFlow,
    purpose: AgentPurpose,
    fallback_id: &'static str,
) -> Result<&'a AgentConfig, ConversationError> {
    flow.agents
        .by_purpose(purpose)
        .ok_or_else(|| ConversationError::AgentNotFound(AgentId::from_static(fallback_id)))
}

/// A single tool, offered only when the qualification rule matches.
fn qualified_tools(flow: &RegisteredFlow, session: &Session, kind: GenerateKind) -> ToolSet {
    if !kind.offers_qualified_embed() {
        return ToolSet::empty();
    }
    match &flow.definition.qualification {
        Some(rule) if rule.matches(session.answers()) => {
            build_tools(&configured_embeds(&flow.definition.embeds).only(rule.embed))
        }
        _ => ToolSet::empty(),
    }
}

/// History plus a kickoff user message when the history does not end with one.
fn with_kickoff(
    flow: &RegisteredFlow,
    session: &Session,
    cmd: &GenerateCommand,
) -> Result<Vec<Message>, ConversationError> {
    let mut messages: Vec<Message> = cmd
        .conversation_history
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .cloned()
        .collect();

    let ends_with_user = messages
        .last()
        .is_some_and(|m| m.role == MessageRole::User && !m.content.trim().is_empty());
    if ends_with_user {
        return Ok(messages);
    }

    let kickoff = match cmd.kind {
        GenerateKind::Relief => {
            "I just finished this part. What do you make of what I shared?".to_string()
        }
        GenerateKind::Diagnosis => "Please write my diagnosis.".to_string(),
        GenerateKind::Qualification => "Would a call make sense for me?".to_string(),
        GenerateKind::Personalize => {
            let step = personalizable_step(flow, session, cmd.step_id.as_deref())?;
            personalize_request(step)
        }
    };
    messages.push(Message::user(kickoff));
    Ok(messages)
}

fn personalizable_step<'a>(
    flow: &'a RegisteredFlow,
    session: &Session,
    step_id: Option<&str>,
) -> Result<&'a Step, ConversationError> {
    let definition = &flow.definition;

    if let Some(step_id) = step_id {
        return match definition.step(step_id) {
            Some((_, step)) if is_personalizable(step) => Ok(step),
            Some(_) => Err(ConversationError::validation(
                "stepId",
                format!("step '{}' cannot be personalized", step_id),
            )),
            None => Err(ConversationError::validation(
                "stepId",
                format!("unknown step '{}'", step_id),
            )),
        };
    }

    let phase_count = definition.phase_count();
    let current = session.stage(phase_count).current_phase(phase_count);
    definition
        .phase(current)
        .and_then(|phase| phase.steps.iter().find(|s| is_personalizable(s)))
        .ok_or_else(|| {
            ConversationError::validation("stepId", "no personalizable question in the current phase")
        })
}

fn is_personalizable(step: &Step) -> bool {
    matches!(
        step.kind,
        StepKind::MultipleChoice {
            personalize: true,
            ..
        } | StepKind::LongAnswer {
            personalize: true,
            ..
        }
    )
}

fn personalize_request(step: &Step) -> String {
    match &step.kind {
        StepKind::MultipleChoice {
            prompt, options, ..
        } => {
            let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
            format!(
                "Rewrite this question for me: \"{}\"\nThe answer options are: {}",
                prompt,
                labels.join("; ")
            )
        }
        StepKind::LongAnswer { prompt, .. } => {
            format!("Rewrite this question for me: \"{}\"", prompt)
        }
        _ => String::new(),
    }
}
