//! HTTP adapter for streaming chat and generation (Server-Sent Events).

mod dto;
mod handlers;
mod routes;

pub use dto::{ChatRequest, GenerateRequest};
pub use handlers::ConversationHandlers;
pub use routes::conversation_routes;
