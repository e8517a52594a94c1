//! Flow query handlers.

mod get_flow;

pub use get_flow::GetFlowHandler;
