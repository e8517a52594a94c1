//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Command handlers (advance, create, update) write through the optimistic
//! session repository; query handlers (get session, get flow) only read.

pub mod handlers;

pub use handlers::{
    AdvanceStepCommand, AdvanceStepHandler, AdvanceStepResult, ChatCommand, ChatHandler,
    ConversationError, ConversationEvent, ConversationOrchestrator, CreateSessionCommand,
    CreateSessionHandler, GenerateCommand, GenerateHandler, GenerateKind, GetFlowHandler,
    GetSessionHandler, PromptResolver, UpdateSessionCommand, UpdateSessionHandler,
};
