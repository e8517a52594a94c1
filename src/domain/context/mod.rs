//! Context module - agent-facing projection of session answers.

mod mapping;
pub mod path;
mod sanitizer;

pub use mapping::ContextMapping;
pub use sanitizer::{sanitize, SanitizedContext};
