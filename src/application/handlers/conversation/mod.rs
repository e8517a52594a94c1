//! Conversation handlers - streamed model calls for chat and one-shot
//! generation.

mod chat;
mod errors;
mod events;
mod generate;
mod orchestrator;
mod prompt_resolver;

pub use chat::{ChatCommand, ChatHandler};
pub use errors::ConversationError;
pub use events::{ConversationEvent, EventStream};
pub use generate::{GenerateCommand, GenerateHandler, GenerateKind};
pub use orchestrator::{AgentTurn, ConversationOrchestrator, OrchestratorSettings};
pub use prompt_resolver::{prompt_variables, PromptResolver};
