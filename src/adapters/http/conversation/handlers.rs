//! HTTP handlers for the streaming chat and generation endpoints.
//!
//! Everything that can fail before the model is called (validation, unknown
//! session or agent) is returned as a plain JSON error. Once streaming has
//! started, failures arrive as an `error` event followed by end of stream.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};

use crate::adapters::http::error::{ApiError, ApiJson};
use crate::adapters::http::session::{parse_session_id, required};
use crate::application::handlers::{
    ChatCommand, ChatHandler, ConversationEvent, EventStream, GenerateCommand, GenerateHandler,
    GenerateKind,
};
use crate::domain::foundation::AgentId;

use super::dto::{ChatRequest, GenerateRequest};

#[derive(Clone)]
pub struct ConversationHandlers {
    chat_handler: Arc<ChatHandler>,
    generate_handler: Arc<GenerateHandler>,
}

impl ConversationHandlers {
    pub fn new(chat_handler: Arc<ChatHandler>, generate_handler: Arc<GenerateHandler>) -> Self {
        Self {
            chat_handler,
            generate_handler,
        }
    }
}

type SseEvents = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;
type SseStream = Sse<SseEvents>;

/// POST /chat - Stream an agent reply
pub async fn chat(
    State(handlers): State<ConversationHandlers>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<SseStream, ApiError> {
    let session_id = parse_session_id(&required(req.session_id, "sessionId")?)?;
    let agent_id = AgentId::new(required(req.agent_id, "agentId")?)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let events = handlers
        .chat_handler
        .handle(ChatCommand {
            session_id,
            agent_id,
            messages: req.messages,
        })
        .await?;

    Ok(into_sse(events))
}

/// POST /generate/:type - Stream a relief, diagnosis, qualification or
/// personalized-question message
pub async fn generate(
    State(handlers): State<ConversationHandlers>,
    Path(kind): Path<String>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> Result<SseStream, ApiError> {
    let kind: GenerateKind = kind.parse()?;
    let session_id = parse_session_id(&required(req.session_id, "sessionId")?)?;

    let events = handlers
        .generate_handler
        .handle(GenerateCommand {
            session_id,
            kind,
            conversation_history: req.conversation_history,
            prompt_key: req.prompt_key.filter(|k| !k.trim().is_empty()),
            step_id: req.step_id,
        })
        .await?;

    Ok(into_sse(events))
}

/// Frames conversation events as named SSE events with JSON data.
fn into_sse(events: EventStream) -> SseStream {
    let stream: SseEvents = Box::pin(events.map(|event| Ok::<_, Infallible>(sse_event(&event))));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn sse_event(event: &ConversationEvent) -> Event {
    let frame = Event::default().event(event.name());
    match serde_json::to_string(event) {
        Ok(data) => frame.data(data),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize conversation event");
            frame.data("{}")
        }
    }
}
