//! Session command and query handlers.

mod advance_step;
mod create_session;
mod get_session;
mod optimistic;
mod update_session;

pub use advance_step::{AdvanceStepCommand, AdvanceStepHandler, AdvanceStepResult};
pub use create_session::{CreateSessionCommand, CreateSessionHandler};
pub use get_session::GetSessionHandler;
pub use optimistic::MAX_WRITE_ATTEMPTS;
pub use update_session::{UpdateSessionCommand, UpdateSessionHandler};
