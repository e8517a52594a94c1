//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence
//!
//! - `SessionRepository` - Session records with optimistic versioning
//! - `MemoryStore` - Conversation memory search
//!
//! ## AI
//!
//! - `AIProvider` - Streaming model calls with tool use
//! - `PromptStore` - Remote editable prompt templates
//! - `TraceSink` - Per-call generation traces
//!
//! ## Edge
//!
//! - `RateLimiter` - Fixed-window request budgets
//! - `SessionValidator` - Optional bearer token validation
//! - `ContactNotifier` - Contact-captured notifications

mod ai_provider;
mod contact_notifier;
mod memory_store;
mod prompt_store;
mod rate_limiter;
mod session_repository;
mod session_validator;
mod trace_sink;

pub use ai_provider::{
    AIError, AIProvider, ChunkStream, CompletionRequest, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, StreamChunk, TokenUsage, ToolCall,
};
pub use contact_notifier::{ContactCaptured, ContactNotifier, NotifierError};
pub use memory_store::{MemoryQuery, MemoryRecord, MemoryStore, MemoryStoreError};
pub use prompt_store::{PromptStore, PromptStoreError, RemotePrompt};
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope,
    RateLimitStatus, RateLimiter,
};
pub use session_repository::SessionRepository;
pub use session_validator::SessionValidator;
pub use trace_sink::{GenerationTrace, TraceError, TraceSink};
