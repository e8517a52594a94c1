//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod conversation;
pub mod flow;
pub mod session;
pub mod side_effects;

pub use conversation::{
    ChatCommand, ChatHandler, ConversationError, ConversationEvent, ConversationOrchestrator,
    EventStream, GenerateCommand, GenerateHandler, GenerateKind, OrchestratorSettings,
    PromptResolver,
};
pub use flow::GetFlowHandler;
pub use session::{
    AdvanceStepCommand, AdvanceStepHandler, AdvanceStepResult, CreateSessionCommand,
    CreateSessionHandler, GetSessionHandler, UpdateSessionCommand, UpdateSessionHandler,
    MAX_WRITE_ATTEMPTS,
};
