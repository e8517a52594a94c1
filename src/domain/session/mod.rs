//! Session domain module.
//!
//! Handles the funnel session lifecycle: creation at the first phase, step
//! progression, answer merging, contact capture and completion.

mod aggregate;
mod answers;
mod contact;
mod errors;

pub use aggregate::{Session, MAX_POINTER_LENGTH};
pub use answers::{answer_patch, merge_answers};
pub use contact::{ContactInfo, ContactUpdate};
pub use errors::SessionError;
