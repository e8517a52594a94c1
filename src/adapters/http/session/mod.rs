//! HTTP adapter for session and step endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AdvanceStepRequest, CreateSessionRequest, SessionCreatedResponse, SessionResponse,
    StepResponse, UpdateSessionRequest,
};
pub use handlers::SessionHandlers;
pub(crate) use handlers::{parse_session_id, required};
pub use routes::session_routes;
