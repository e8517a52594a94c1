//! Flow Definition Registry.
//!
//! Holds every flow the process serves, each with its resolved agent set.
//! Populated once at start-up and read-only afterwards.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use super::definition::{FlowDefinition, StepKind};
use super::errors::FlowError;
use crate::domain::agents::AgentRegistry;
use crate::domain::context::{sanitize, SanitizedContext};
use crate::domain::foundation::{AgentId, FlowId};

const BUNDLED_FLOWS: &[(&str, &str)] = &[
    ("freelancer-clarity.yaml", include_str!("bundled/freelancer-clarity.yaml")),
    ("studio-launch.yaml", include_str!("bundled/studio-launch.yaml")),
];

/// A flow together with the agents resolved for it.
#[derive(Debug, Clone)]
pub struct RegisteredFlow {
    pub definition: Arc<FlowDefinition>,
    pub agents: Arc<AgentRegistry>,
}

#[derive(Debug, Clone, Default)]
pub struct FlowRegistry {
    flows: BTreeMap<FlowId, RegisteredFlow>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the flows compiled into the binary.
    pub fn bundled() -> Result<Self, FlowError> {
        let mut registry = Self::new();
        for (name, yaml) in BUNDLED_FLOWS {
            registry.register(FlowDefinition::from_yaml(name, yaml)?)?;
        }
        Ok(registry)
    }

    /// Loads every `.yaml` / `.yml` file in `dir`.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, FlowError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| FlowError::Io(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        paths.sort();

        for path in &paths {
            let yaml = std::fs::read_to_string(path)
                .map_err(|e| FlowError::Io(format!("{}: {}", path.display(), e)))?;
            let flow = FlowDefinition::from_yaml(&path.display().to_string(), &yaml)?;
            tracing::info!(flow_id = %flow.id, path = %path.display(), "Loaded flow definition");
            self.register(flow)?;
        }
        Ok(paths.len())
    }

    /// Adds a validated flow. Ids must be unique and every AI moment must name a
    /// known agent.
    pub fn register(&mut self, flow: FlowDefinition) -> Result<(), FlowError> {
        if self.flows.contains_key(&flow.id) {
            return Err(FlowError::Duplicate(flow.id));
        }

        let agents = AgentRegistry::for_flow(
            flow.phases.iter().map(|p| (p.id, p.name.as_str())),
            &flow.agents,
        );

        for phase in &flow.phases {
            for step in &phase.steps {
                if let StepKind::AiMoment { agent, .. } = &step.kind {
                    let agent_id = agent.clone().unwrap_or_else(|| AgentId::relief_for_phase(phase.id));
                    if !agents.contains(&agent_id) {
                        return Err(FlowError::invalid(
                            &flow.id,
                            format!("step '{}' references unknown agent '{}'", step.id, agent_id),
                        ));
                    }
                }
            }
        }

        self.flows.insert(
            flow.id.clone(),
            RegisteredFlow {
                definition: Arc::new(flow),
                agents: Arc::new(agents),
            },
        );
        Ok(())
    }

    pub fn get(&self, id: &FlowId) -> Option<&RegisteredFlow> {
        self.flows.get(id)
    }

    /// Flow definition by id, or `NotFound`.
    pub fn require(&self, id: &FlowId) -> Result<&RegisteredFlow, FlowError> {
        self.get(id).ok_or_else(|| FlowError::NotFound(id.clone()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &FlowId> {
        self.flows.keys()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Projects raw answers through the flow's context mapping.
    ///
    /// Unknown flows and flows without a mapping yield an empty context.
    pub fn sanitize(&self, flow_id: &FlowId, raw: &Value, first_name: Option<&str>) -> SanitizedContext {
        let mapping = self
            .get(flow_id)
            .and_then(|flow| flow.definition.context_mapping.as_ref());
        sanitize(mapping, raw, first_name)
    }
}
