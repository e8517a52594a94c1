//! ConversationOrchestrator - one streamed model call per agent turn.
//!
//! Resolves the prompt, recalls memory, invokes the provider and pumps its
//! chunks into [`ConversationEvent`]s on a spawned task. Memory and trace
//! writes happen after the final event, detached from the response.

use futures::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::errors::ConversationError;
use super::events::{ConversationEvent, EventStream};
use super::prompt_resolver::{prompt_variables, PromptResolver};
use crate::application::handlers::side_effects::spawn_detached;
use crate::domain::agents::{effective_system_prompt, AgentConfig, PromptSource, PromptVersion};
use crate::domain::context::SanitizedContext;
use crate::domain::embeds::ToolSet;
use crate::domain::flow::{FlowRegistry, RegisteredFlow};
use crate::domain::foundation::{AgentId, ErrorCode, SessionId};
use crate::domain::session::Session;
use crate::ports::{
    AIProvider, ChunkStream, CompletionRequest, FinishReason, GenerationTrace, MemoryQuery,
    MemoryRecord, MemoryStore, Message, MessageRole, RequestMetadata, SessionRepository,
    TokenUsage, TraceSink,
};

const EVENT_BUFFER: usize = 32;

/// Message shown to the visitor when the model fails mid-stream.
const MODEL_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while writing this reply. Please try again.";

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Memories recalled per turn. Zero disables recall.
    pub memory_recall_limit: usize,
    pub memory_timeout: Duration,
    /// Most recent messages forwarded to the model. `None` forwards all.
    pub max_history: Option<usize>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            memory_recall_limit: 3,
            memory_timeout: Duration::from_millis(800),
            max_history: Some(40),
        }
    }
}

/// Everything one model call needs, already validated.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub session: Session,
    pub flow: RegisteredFlow,
    pub agent: AgentConfig,
    pub messages: Vec<Message>,
    pub tools: ToolSet,
    pub context: SanitizedContext,
}

pub struct ConversationOrchestrator {
    ai: Arc<dyn AIProvider>,
    prompts: PromptResolver,
    memory: Arc<dyn MemoryStore>,
    traces: Arc<dyn TraceSink>,
    settings: OrchestratorSettings,
}

impl ConversationOrchestrator {
    pub fn new(
        ai: Arc<dyn AIProvider>,
        prompts: PromptResolver,
        memory: Arc<dyn MemoryStore>,
        traces: Arc<dyn TraceSink>,
    ) -> Self {
        Self {
            ai,
            prompts,
            memory,
            traces,
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Starts the model call and returns its event stream.
    ///
    /// Errors are returned only when nothing has been streamed yet. After that,
    /// failures arrive as a single `error` event.
    #[tracing::instrument(skip(self, turn), fields(session_id = %turn.session.id(), agent_id = %turn.agent.id))]
    pub async fn run(&self, turn: AgentTurn) -> Result<EventStream, ConversationError> {
        let started = Instant::now();
        let AgentTurn {
            session,
            flow,
            agent,
            messages,
            tools,
            context,
        } = turn;

        let variables = prompt_variables(&flow.definition, &session);
        let prompt = self
            .prompts
            .resolve(&agent, flow.definition.context_mapping.as_ref(), &variables)
            .await;

        let last_user_message = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let memories = self.recall(*session.id(), &last_user_message).await;

        let system_prompt =
            effective_system_prompt(&prompt.system_prompt, &context.describe(), &memories);
        let trace_id = Uuid::new_v4().to_string();
        let model = agent
            .model
            .clone()
            .unwrap_or_else(|| self.ai.provider_info().model);

        let request = CompletionRequest::new(
            RequestMetadata::new(*session.id(), agent.id.clone(), trace_id.clone())
                .with_user(session.user_id().cloned()),
        )
        .with_system_prompt(system_prompt)
        .with_model(agent.model.clone())
        .with_max_tokens(agent.max_tokens)
        .with_temperature(agent.temperature)
        .with_tools(tools.definitions())
        .with_messages(self.cap_history(messages));

        let chunks = self.ai.stream_complete(request).await.map_err(|e| {
            tracing::error!(error = %e, "Model call failed before streaming");
            ConversationError::Upstream(e)
        })?;

        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let pump = TurnPump {
            tools,
            memory: self.memory.clone(),
            traces: self.traces.clone(),
            session_id: *session.id(),
            agent_id: agent.id.clone(),
            trace_id,
            model,
            prompt_source: prompt.source,
            prompt_version: prompt.version,
            last_user_message,
            started,
        };
        tokio::spawn(pump.run(chunks, tx));

        Ok(Box::pin(futures::stream::poll_fn(move |cx| rx.poll_recv(cx))))
    }

    async fn recall(&self, session_id: SessionId, text: &str) -> Vec<String> {
        if self.settings.memory_recall_limit == 0 || text.trim().is_empty() {
            return Vec::new();
        }
        let query = MemoryQuery::new(session_id, text, self.settings.memory_recall_limit);
        match tokio::time::timeout(self.settings.memory_timeout, self.memory.recall(&query)).await {
            Ok(Ok(records)) => records.into_iter().map(|r| r.content).collect(),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Memory recall failed, continuing without");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!("Memory recall timed out, continuing without");
                Vec::new()
            }
        }
    }

    fn cap_history(&self, mut messages: Vec<Message>) -> Vec<Message> {
        if let Some(max) = self.settings.max_history {
            if messages.len() > max {
                messages.drain(..messages.len() - max);
            }
        }
        messages
    }
}

/// Drives one provider stream to the client.
struct TurnPump {
    tools: ToolSet,
    memory: Arc<dyn MemoryStore>,
    traces: Arc<dyn TraceSink>,
    session_id: SessionId,
    agent_id: AgentId,
    trace_id: String,
    model: String,
    prompt_source: PromptSource,
    prompt_version: Option<PromptVersion>,
    last_user_message: String,
    started: Instant,
}

#[derive(Debug, Default)]
struct TurnOutcome {
    text: String,
    tool_calls: Vec<String>,
    usage: Option<TokenUsage>,
    finish_reason: Option<FinishReason>,
    error: Option<String>,
}

impl TurnPump {
    async fn run(self, mut chunks: ChunkStream, tx: mpsc::Sender<ConversationEvent>) {
        let mut outcome = TurnOutcome::default();

        loop {
            let next = tokio::select! {
                _ = tx.closed() => {
                    outcome.error = Some("client disconnected".to_string());
                    break;
                }
                next = chunks.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, trace_id = %self.trace_id, "Model stream failed");
                    outcome.error = Some(e.to_string());
                    outcome.finish_reason = Some(FinishReason::Error);
                    let _ = tx
                        .send(ConversationEvent::error(ErrorCode::AIProviderError, MODEL_FAILURE_MESSAGE))
                        .await;
                    break;
                }
                None => {
                    let finish_reason = FinishReason::Stop;
                    let usage = TokenUsage::zero();
                    outcome.finish_reason = Some(finish_reason);
                    outcome.usage = Some(usage);
                    let _ = tx.send(ConversationEvent::Done { finish_reason, usage }).await;
                    break;
                }
            };

            if !chunk.delta.is_empty() {
                outcome.text.push_str(&chunk.delta);
                if tx.send(ConversationEvent::text(chunk.delta)).await.is_err() {
                    outcome.error = Some("client disconnected".to_string());
                    break;
                }
            }

            if let Some(call) = chunk.tool_call {
                match self.tools.invoke(&call.name, &call.input) {
                    Ok(invocation) => {
                        outcome.tool_calls.push(call.name);
                        if tx.send(ConversationEvent::Tool { invocation }).await.is_err() {
                            outcome.error = Some("client disconnected".to_string());
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(tool = %call.name, error = %e, "Ignoring invalid tool call");
                    }
                }
            }

            if let Some(finish_reason) = chunk.finish_reason {
                let usage = chunk.usage.unwrap_or_else(TokenUsage::zero);
                outcome.finish_reason = Some(finish_reason);
                outcome.usage = Some(usage);
                let _ = tx.send(ConversationEvent::Done { finish_reason, usage }).await;
                break;
            }
        }

        drop(chunks);
        self.finish(outcome);
    }

    fn finish(self, outcome: TurnOutcome) {
        if outcome.error.is_none() && !outcome.text.trim().is_empty() {
            let record = MemoryRecord::new(
                self.session_id,
                self.agent_id.clone(),
                format!("Visitor: {}\nAssistant: {}", self.last_user_message, outcome.text),
            );
            let memory = self.memory;
            spawn_detached("memory_write", async move { memory.remember(record).await });
        }

        let trace = GenerationTrace {
            trace_id: self.trace_id,
            session_id: self.session_id,
            agent_id: self.agent_id,
            model: self.model,
            prompt_source: self.prompt_source,
            prompt_version: self.prompt_version,
            latency_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            usage: outcome.usage.unwrap_or_else(TokenUsage::zero),
            finish_reason: outcome.finish_reason.unwrap_or(FinishReason::Error),
            tool_calls: outcome.tool_calls,
            output_chars: outcome.text.chars().count(),
            error: outcome.error,
        };
        let traces = self.traces;
        spawn_detached("trace_record", async move { traces.record(trace).await });
    }
}

/// Loads a session together with its registered flow.
pub(super) async fn load_session_flow(
    sessions: &dyn SessionRepository,
    flows: &FlowRegistry,
    session_id: SessionId,
) -> Result<(Session, RegisteredFlow), ConversationError> {
    let session = sessions
        .find_by_id(&session_id)
        .await?
        .ok_or(ConversationError::SessionNotFound(session_id))?;
    let flow = flows
        .get(session.flow_id())
        .cloned()
        .ok_or_else(|| ConversationError::FlowNotFound(session.flow_id().clone()))?;
    Ok((session, flow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::adapters::prompts::InMemoryPromptStore;
    use crate::adapters::storage::InMemoryMemoryStore;
    use crate::adapters::telemetry::RecordingTraceSink;
    use crate::domain::embeds::{build_tools, configured_embeds};
    use crate::domain::foundation::{AccountId, FlowId};
    use crate::ports::{AIError, MemoryStoreError, TraceError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        ai: MockAIProvider,
        memory: InMemoryMemoryStore,
        traces: RecordingTraceSink,
        orchestrator: ConversationOrchestrator,
    }

    fn fixture(ai: MockAIProvider) -> Fixture {
        let memory = InMemoryMemoryStore::new();
        let traces = RecordingTraceSink::new();
        let orchestrator = ConversationOrchestrator::new(
            Arc::new(ai.clone()),
            PromptResolver::new(Arc::new(InMemoryPromptStore::new())),
            Arc::new(memory.clone()),
            Arc::new(traces.clone()),
        );
        Fixture {
            ai,
            memory,
            traces,
            orchestrator,
        }
    }

    fn turn(tools: ToolSet) -> AgentTurn {
        let flows = FlowRegistry::bundled().unwrap();
        let flow = flows
            .require(&FlowId::new("freelancer-clarity").unwrap())
            .unwrap()
            .clone();
        let session = Session::new(
            SessionId::new(),
            AccountId::new("acct_1").unwrap(),
            FlowId::new("freelancer-clarity").unwrap(),
            None,
            Some(json!({"situation": {"bookingStatus": "booked-1-month"}})),
        )
        .unwrap();
        let context = flows.sanitize(session.flow_id(), session.answers(), None);
        let agent = flow
            .agents
            .get(&AgentId::new("chat").unwrap())
            .unwrap()
            .clone();
        AgentTurn {
            session,
            flow,
            agent,
            messages: vec![Message::user("How do I raise my rates?")],
            tools,
            context,
        }
    }

    async fn wait_for_traces(traces: &RecordingTraceSink) -> Vec<GenerationTrace> {
        for _ in 0..100 {
            let recorded = traces.traces().await;
            if !recorded.is_empty() {
                return recorded;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        Vec::new()
    }

    #[tokio::test]
    async fn streams_text_then_done() {
        let f = fixture(MockAIProvider::new().with_response("Start with one client."));
        let turn = turn(ToolSet::empty());
        let session_id = *turn.session.id();

        let events: Vec<_> = f.orchestrator.run(turn).await.unwrap().collect().await;

        let text: String = events
            .iter()
            .filter_map(|e| match e {
                ConversationEvent::Text { delta } => Some(delta.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Start with one client.");
        assert!(matches!(events.last(), Some(ConversationEvent::Done { .. })));

        let traces = wait_for_traces(&f.traces).await;
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].prompt_source, PromptSource::Fallback);
        assert!(traces[0].error.is_none());
        for _ in 0..100 {
            if f.memory.count(&session_id).await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(f.memory.count(&session_id).await, 1);
    }

    #[tokio::test]
    async fn request_carries_sanitized_context_and_tools() {
        let f = fixture(MockAIProvider::new().with_response("ok"));
        let flow_embeds = turn(ToolSet::empty()).flow.definition.embeds.clone();
        let tools = build_tools(&configured_embeds(&flow_embeds));

        let _: Vec<_> = f.orchestrator.run(turn(tools)).await.unwrap().collect().await;

        let call = &f.ai.calls()[0];
        let system = call.system_prompt.as_deref().unwrap();
        assert!(system.contains("booked-1-month"));
        assert!(system.contains("## Visitor data you can use"));
        assert_eq!(call.tools.len(), 3);
        assert_eq!(call.max_tokens, Some(800));
    }

    #[tokio::test]
    async fn tool_calls_become_tool_events() {
        let ai = MockAIProvider::new()
            .with_response("Here is a walkthrough.")
            .with_tool_call("show_video", json!({"before_text": "Watch this"}));
        let f = fixture(ai);
        let flow_embeds = turn(ToolSet::empty()).flow.definition.embeds.clone();
        let tools = build_tools(&configured_embeds(&flow_embeds));

        let events: Vec<_> = f.orchestrator.run(turn(tools)).await.unwrap().collect().await;

        let invocation = events
            .iter()
            .find_map(|e| match e {
                ConversationEvent::Tool { invocation } => Some(invocation.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(invocation.before_text, "Watch this");
        assert!(invocation.resource_id.contains("walkthrough"));
    }

    #[tokio::test]
    async fn unknown_tool_call_is_dropped() {
        let ai = MockAIProvider::new()
            .with_response("Sure.")
            .with_tool_call("show_checkout", json!({}));
        let f = fixture(ai);

        let events: Vec<_> = f
            .orchestrator
            .run(turn(ToolSet::empty()))
            .await
            .unwrap()
            .collect()
            .await;

        assert!(!events.iter().any(|e| matches!(e, ConversationEvent::Tool { .. })));
        assert!(matches!(events.last(), Some(ConversationEvent::Done { .. })));
    }

    #[tokio::test]
    async fn failure_before_streaming_is_upstream() {
        let f = fixture(MockAIProvider::new().with_error(AIError::AuthenticationFailed));
        let err = f.orchestrator.run(turn(ToolSet::empty())).await.err().unwrap();
        assert_eq!(err, ConversationError::Upstream(AIError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn mid_stream_failure_is_one_error_event() {
        let ai = MockAIProvider::new()
            .with_stream_failure("Partial answer ", AIError::network("reset"));
        let f = fixture(ai);
        let turn = turn(ToolSet::empty());
        let session_id = *turn.session.id();

        let events: Vec<_> = f.orchestrator.run(turn).await.unwrap().collect().await;

        let errors = events
            .iter()
            .filter(|e| matches!(e, ConversationEvent::Error { .. }))
            .count();
        assert_eq!(errors, 1);
        assert!(matches!(events.last(), Some(ConversationEvent::Error { .. })));

        let traces = wait_for_traces(&f.traces).await;
        assert!(traces[0].error.is_some());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(f.memory.count(&session_id).await, 0);
    }

    #[tokio::test]
    async fn dropping_the_stream_records_disconnect() {
        let ai = MockAIProvider::new()
            .with_response("one two three four five six seven eight nine ten")
            .with_delay(Duration::from_millis(20));
        let f = fixture(ai);

        let mut events = f.orchestrator.run(turn(ToolSet::empty())).await.unwrap();
        let first = events.next().await;
        assert!(matches!(first, Some(ConversationEvent::Text { .. })));
        drop(events);

        let traces = wait_for_traces(&f.traces).await;
        assert_eq!(traces[0].error.as_deref(), Some("client disconnected"));
    }

    #[tokio::test]
    async fn recalled_memory_reaches_the_prompt() {
        let f = fixture(MockAIProvider::new().with_response("ok"));
        let turn = turn(ToolSet::empty());
        f.memory
            .remember(MemoryRecord::new(
                *turn.session.id(),
                AgentId::new("chat").unwrap(),
                "Visitor said their rates feel too low",
            ))
            .await
            .unwrap();

        let _: Vec<_> = f.orchestrator.run(turn).await.unwrap().collect().await;

        let system = f.ai.calls()[0].system_prompt.clone().unwrap();
        assert!(system.contains("rates feel too low"));
    }

    #[derive(Default)]
    struct BrokenSideChannels {
        recalls: AtomicUsize,
        writes: AtomicUsize,
        traces: AtomicUsize,
    }

    #[async_trait]
    impl MemoryStore for BrokenSideChannels {
        async fn recall(&self, _query: &MemoryQuery) -> Result<Vec<MemoryRecord>, MemoryStoreError> {
            self.recalls.fetch_add(1, Ordering::SeqCst);
            Err(MemoryStoreError::Unavailable("connection refused".into()))
        }

        async fn remember(&self, _record: MemoryRecord) -> Result<(), MemoryStoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(MemoryStoreError::Unavailable("connection refused".into()))
        }
    }

    #[async_trait]
    impl TraceSink for BrokenSideChannels {
        async fn record(&self, _trace: GenerationTrace) -> Result<(), TraceError> {
            self.traces.fetch_add(1, Ordering::SeqCst);
            Err(TraceError::Unavailable("collector down".into()))
        }
    }

    #[tokio::test]
    async fn failing_memory_and_traces_do_not_reach_the_visitor() {
        let broken = Arc::new(BrokenSideChannels::default());
        let orchestrator = ConversationOrchestrator::new(
            Arc::new(MockAIProvider::new().with_response("Raise them for new clients first.")),
            PromptResolver::new(Arc::new(InMemoryPromptStore::new())),
            broken.clone(),
            broken.clone(),
        );

        let events: Vec<_> = orchestrator.run(turn(ToolSet::empty())).await.unwrap().collect().await;

        let text: String = events
            .iter()
            .filter_map(|e| match e {
                ConversationEvent::Text { delta } => Some(delta.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "Raise them for new clients first.");
        assert!(matches!(events.last(), Some(ConversationEvent::Done { .. })));
        assert!(!events.iter().any(|e| matches!(e, ConversationEvent::Error { .. })));

        for _ in 0..100 {
            if broken.writes.load(Ordering::SeqCst) == 1 && broken.traces.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(broken.recalls.load(Ordering::SeqCst), 1);
        assert_eq!(broken.writes.load(Ordering::SeqCst), 1);
        assert_eq!(broken.traces.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn history_is_capped_to_most_recent() {
        let f = fixture(MockAIProvider::new());
        let orchestrator = f.orchestrator.with_settings(OrchestratorSettings {
            max_history: Some(2),
            ..OrchestratorSettings::default()
        });
        let capped = orchestrator.cap_history(vec![
            Message::user("a"),
            Message::assistant("b"),
            Message::user("c"),
        ]);
        assert_eq!(capped, vec![Message::assistant("b"), Message::user("c")]);
    }
}
