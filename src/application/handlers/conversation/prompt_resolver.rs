//! Prompt resolution: remote editable prompt with a code-owned data section,
//! falling back to the agent's built-in prompt.

use std::sync::Arc;

use crate::domain::agents::{
    compile_template, compose, data_access_doc, AgentConfig, PromptSource, PromptVariables,
    ResolvedPrompt,
};
use crate::domain::context::ContextMapping;
use crate::domain::flow::FlowDefinition;
use crate::domain::session::Session;
use crate::ports::PromptStore;

pub struct PromptResolver {
    store: Arc<dyn PromptStore>,
    label: Option<String>,
}

impl PromptResolver {
    pub fn new(store: Arc<dyn PromptStore>) -> Self {
        Self { store, label: None }
    }

    /// Pins prompt lookups to a label instead of the store's default.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Resolves the base system prompt for `agent`.
    ///
    /// Never fails: a missing prompt or an unreachable store yields the
    /// agent's fallback prompt.
    pub async fn resolve(
        &self,
        agent: &AgentConfig,
        mapping: Option<&ContextMapping>,
        variables: &PromptVariables,
    ) -> ResolvedPrompt {
        let doc = data_access_doc(agent, mapping);
        let key = agent.prompt_key();

        match self.store.fetch(key, self.label.as_deref()).await {
            Ok(Some(remote)) => {
                return ResolvedPrompt {
                    system_prompt: compose(&doc, &compile_template(&remote.template, variables)),
                    version: Some(remote.version_info()),
                    source: PromptSource::Remote,
                };
            }
            Ok(None) => {
                tracing::debug!(prompt = key, agent_id = %agent.id, "No remote prompt, using fallback");
            }
            Err(e) => {
                tracing::warn!(prompt = key, agent_id = %agent.id, error = %e, "Prompt store failed, using fallback");
            }
        }

        ResolvedPrompt {
            system_prompt: compose(&doc, &compile_template(&agent.fallback_prompt, variables)),
            version: None,
            source: PromptSource::Fallback,
        }
    }
}

/// Template variables available to every prompt of a session.
pub fn prompt_variables(flow: &FlowDefinition, session: &Session) -> PromptVariables {
    let phase_count = flow.phase_count();
    let current = session.stage(phase_count).current_phase(phase_count);
    let phase_name = flow
        .phase(current)
        .map(|p| p.name.clone())
        .unwrap_or_default();

    PromptVariables::new()
        .with("first_name", session.first_name().unwrap_or("there"))
        .with("flow_name", flow.name.clone())
        .with("phase_name", phase_name)
}
