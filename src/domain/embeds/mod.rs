//! Embeds module - conversion widgets unlocked by phase completion and the
//! tools that let the conversational model show them.

mod availability;
mod tool_definition;
mod tools;

pub use availability::{
    available_embeds, configured_embeds, AvailableEmbeds, EmbedConfig, EmbedKind, EmbedTrigger,
};
pub use tool_definition::ToolDefinition;
pub use tools::{build_tools, EmbedInvocation, EmbedTool, ToolCallError, ToolSet};
