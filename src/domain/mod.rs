//! Domain layer - pure funnel rules with no I/O.

pub mod agents;
pub mod context;
pub mod embeds;
pub mod flow;
pub mod foundation;
pub mod session;
