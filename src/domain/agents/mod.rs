//! Agents module - AI capability configuration and prompt composition.

mod config;
mod data_access;
mod prompt;
mod registry;

pub use config::{
    default_agents, default_relief_agent, AgentConfig, AgentPurpose, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE,
};
pub use data_access::data_access_doc;
pub use prompt::{
    compile_template, compose, effective_system_prompt, PromptSource, PromptVariables,
    PromptVersion, ResolvedPrompt,
};
pub use registry::AgentRegistry;
