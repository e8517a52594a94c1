//! Application router assembly.
//!
//! Feature routers are built from shared ports and merged into one app:
//!
//! ```text
//! request id → TraceLayer → compression → CORS → Timeout → auth (optional) → feature routes
//!                                                   ├─ /session, /flow/step
//!                                                   ├─ /flow/:flow_id
//!                                                   ├─ /chat        (rate limited)
//!                                                   ├─ /generate/:kind (rate limited)
//!                                                   └─ /health
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Json, Router};
use http::{HeaderName, HeaderValue};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::application::handlers::session::{
    AdvanceStepHandler, CreateSessionHandler, GetSessionHandler, UpdateSessionHandler,
};
use crate::application::handlers::{
    ChatHandler, ConversationOrchestrator, GenerateHandler, GetFlowHandler, OrchestratorSettings,
    PromptResolver,
};
use crate::domain::flow::FlowRegistry;
use crate::ports::{
    AIProvider, ContactNotifier, MemoryStore, PromptStore, RateLimiter, SessionRepository,
    SessionValidator, TraceSink,
};

use super::conversation::{conversation_routes, ConversationHandlers};
use super::flow::flow_routes;
use super::middleware::auth_middleware;
use super::session::{session_routes, SessionHandlers};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Ports and registries the HTTP surface is built from.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionRepository>,
    pub flows: Arc<FlowRegistry>,
    pub ai: Arc<dyn AIProvider>,
    pub prompts: Arc<dyn PromptStore>,
    pub prompt_label: Option<String>,
    pub memory: Arc<dyn MemoryStore>,
    pub traces: Arc<dyn TraceSink>,
    pub notifier: Arc<dyn ContactNotifier>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Bearer token validation; `None` serves everyone anonymously.
    pub auth: Option<Arc<dyn SessionValidator>>,
    pub orchestrator_settings: OrchestratorSettings,
}

/// Transport settings for the router.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Allowed CORS origins. Empty or `*` allows any origin.
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Builds the full application router.
pub fn app_router(state: AppState, options: &HttpOptions) -> Router {
    let session_handlers = SessionHandlers::new(
        Arc::new(CreateSessionHandler::new(state.sessions.clone(), state.flows.clone())),
        Arc::new(GetSessionHandler::new(state.sessions.clone())),
        Arc::new(UpdateSessionHandler::new(
            state.sessions.clone(),
            state.flows.clone(),
            state.notifier.clone(),
        )),
        Arc::new(AdvanceStepHandler::new(
            state.sessions.clone(),
            state.flows.clone(),
            state.notifier.clone(),
        )),
    );

    let mut resolver = PromptResolver::new(state.prompts.clone());
    if let Some(label) = &state.prompt_label {
        resolver = resolver.with_label(label.clone());
    }
    let orchestrator = Arc::new(
        ConversationOrchestrator::new(
            state.ai.clone(),
            resolver,
            state.memory.clone(),
            state.traces.clone(),
        )
        .with_settings(state.orchestrator_settings.clone()),
    );
    let conversation_handlers = ConversationHandlers::new(
        Arc::new(ChatHandler::new(
            state.sessions.clone(),
            state.flows.clone(),
            orchestrator.clone(),
        )),
        Arc::new(GenerateHandler::new(
            state.sessions.clone(),
            state.flows.clone(),
            orchestrator,
        )),
    );

    let mut app = Router::new()
        .merge(session_routes(session_handlers))
        .merge(flow_routes(Arc::new(GetFlowHandler::new(state.flows.clone()))))
        .merge(conversation_routes(conversation_handlers, state.rate_limiter.clone()))
        .route("/health", get(health));

    if let Some(validator) = state.auth.clone() {
        app = app.layer(middleware::from_fn_with_state(validator, auth_middleware));
    }

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    app.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id))
            // Event streams are excluded by the default predicate.
            .layer(CompressionLayer::new())
            .layer(cors_layer(&options.cors_origins))
            .layer(TimeoutLayer::new(options.request_timeout)),
    )
}

/// GET /health - Liveness check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}
