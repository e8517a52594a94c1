//! Agent lookup for one flow.

use std::collections::BTreeMap;

use super::config::{default_agents, default_relief_agent, AgentConfig, AgentPurpose};
use crate::domain::foundation::AgentId;

/// Resolved set of agents available to a flow.
///
/// Built-in agents are layered first, then a default relief agent per phase,
/// then whatever the flow declares. Later layers replace earlier ones by id.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<AgentId, AgentConfig>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the built-in agents.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for agent in default_agents() {
            registry.register(agent);
        }
        registry
    }

    /// Registry for a flow given `(phase id, phase name)` pairs.
    pub fn for_flow<'a>(
        phase_names: impl IntoIterator<Item = (u32, &'a str)>,
        flow_agents: &[AgentConfig],
    ) -> Self {
        let mut registry = Self::with_defaults();
        for (phase, name) in phase_names {
            registry.register(default_relief_agent(phase, name));
        }
        for agent in flow_agents {
            registry.register(agent.clone());
        }
        registry
    }

    pub fn register(&mut self, agent: AgentConfig) {
        self.agents.insert(agent.id.clone(), agent);
    }

    pub fn get(&self, id: &AgentId) -> Option<&AgentConfig> {
        self.agents.get(id)
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.agents.contains_key(id)
    }

    /// First agent (in id order) serving `purpose`.
    pub fn by_purpose(&self, purpose: AgentPurpose) -> Option<&AgentConfig> {
        self.agents.values().find(|a| a.purpose == purpose)
    }

    /// Relief agent speaking for `phase`.
    pub fn relief_for_phase(&self, phase: u32) -> Option<&AgentConfig> {
        self.get(&AgentId::relief_for_phase(phase)).or_else(|| {
            self.agents
                .values()
                .find(|a| a.purpose == AgentPurpose::Relief && a.phase == Some(phase))
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = &AgentId> {
        self.agents.keys()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
