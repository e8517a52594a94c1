//! PostgreSQL adapters.
//!
//! Both adapters share one `PgPool`. Schema lives in `migrations/`.

mod memory_store;
mod session_repository;

pub use memory_store::PostgresMemoryStore;
pub use session_repository::PostgresSessionRepository;
