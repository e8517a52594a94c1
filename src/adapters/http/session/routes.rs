//! HTTP routes for session and step endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{advance_step, create_session, get_session, update_session, SessionHandlers};

/// Creates the session router with all endpoints.
pub fn session_routes(handlers: SessionHandlers) -> Router {
    Router::new()
        .route("/session", post(create_session))
        .route("/session/:id", get(get_session).patch(update_session))
        .route("/flow/step", post(advance_step))
        .with_state(handlers)
}
