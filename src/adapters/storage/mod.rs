//! In-memory storage adapters.
//!
//! Implementations of the persistence ports that keep everything in process
//! memory. Used when no database is configured and throughout the tests.
//!
//! ## Available Adapters
//!
//! - **InMemorySessionRepository** - Sessions with optimistic versioning
//! - **InMemoryMemoryStore** - Conversation memory with word-overlap recall
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemoryMemoryStore, InMemorySessionRepository};
//!
//! let sessions = Arc::new(InMemorySessionRepository::new());
//! let memory = Arc::new(InMemoryMemoryStore::new());
//! ```

mod memory_store;
mod session_repository;

pub use memory_store::InMemoryMemoryStore;
pub use session_repository::InMemorySessionRepository;
