//! Declarative flow definitions.
//!
//! A flow is pure data: ordered phases of ordered steps, plus agent, embed and
//! context-mapping configuration. One interpreter walks every flow.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use super::errors::FlowError;
use super::pointer::StepPointer;
use crate::domain::agents::AgentConfig;
use crate::domain::context::{path::get_path, ContextMapping};
use crate::domain::embeds::{EmbedConfig, EmbedKind};
use crate::domain::foundation::{AgentId, FlowId};

/// Immutable definition of one funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub id: FlowId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub phases: Vec<Phase>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub embeds: EmbedConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_mapping: Option<ContextMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<QualificationRule>,
}

/// An ordered group of steps; the unit of completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: u32,
    pub name: String,
    pub steps: Vec<Step>,
}

/// The smallest addressable unit of interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(flatten)]
    pub kind: StepKind,
}

/// Step variants. Each carries only the fields its kind needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    MultipleChoice {
        prompt: String,
        state_key: String,
        options: Vec<ChoiceOption>,
        #[serde(default)]
        allow_multiple: bool,
        #[serde(default)]
        personalize: bool,
    },
    LongAnswer {
        prompt: String,
        state_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        #[serde(default)]
        personalize: bool,
    },
    ContactInfo {
        prompt: String,
        state_key: String,
    },
    AiMoment {
        /// Agent generating the relief message; defaults to the phase's relief agent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent: Option<AgentId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headline: Option<String>,
    },
    SalesPage {
        headline: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        embed: Option<EmbedKind>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

/// Condition under which one-shot generation may offer a single embed tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationRule {
    /// Path into the raw answer tree.
    pub answer_path: String,
    /// The rule matches when the answer equals any of these values.
    pub any_of: Vec<serde_json::Value>,
    pub embed: EmbedKind,
}

impl QualificationRule {
    pub fn matches(&self, answers: &serde_json::Value) -> bool {
        match get_path(answers, &self.answer_path) {
            Some(serde_json::Value::Array(selected)) => {
                selected.iter().any(|v| self.any_of.contains(v))
            }
            Some(value) => self.any_of.contains(value),
            None => false,
        }
    }
}

impl StepKind {
    /// State key for question steps.
    pub fn state_key(&self) -> Option<&str> {
        match self {
            StepKind::MultipleChoice { state_key, .. }
            | StepKind::LongAnswer { state_key, .. }
            | StepKind::ContactInfo { state_key, .. } => Some(state_key),
            StepKind::AiMoment { .. } | StepKind::SalesPage { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepKind::MultipleChoice { .. } => "multiple_choice",
            StepKind::LongAnswer { .. } => "long_answer",
            StepKind::ContactInfo { .. } => "contact_info",
            StepKind::AiMoment { .. } => "ai_moment",
            StepKind::SalesPage { .. } => "sales_page",
        }
    }
}

impl FlowDefinition {
    /// Parses and validates a YAML document.
    pub fn from_yaml(source_name: &str, yaml: &str) -> Result<Self, FlowError> {
        let flow: FlowDefinition =
            serde_yaml::from_str(yaml).map_err(|e| FlowError::Parse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        flow.validate()?;
        Ok(flow)
    }

    pub fn phase_count(&self) -> u32 {
        self.phases.len() as u32
    }

    pub fn phase(&self, id: u32) -> Option<&Phase> {
        self.phases.iter().find(|p| p.id == id)
    }

    /// Finds a step anywhere in the flow, with the phase that holds it.
    pub fn step(&self, step_id: &str) -> Option<(&Phase, &Step)> {
        self.phases
            .iter()
            .find_map(|phase| phase.steps.iter().find(|s| s.id == step_id).map(|s| (phase, s)))
    }

    /// Top-level answer namespaces that merge deeply rather than being replaced.
    ///
    /// These are the first segments of every dotted question state key.
    pub fn answer_namespaces(&self) -> BTreeSet<String> {
        self.phases
            .iter()
            .flat_map(|p| p.steps.iter())
            .filter_map(|s| s.kind.state_key())
            .filter_map(|key| key.split_once('.').map(|(ns, _)| ns.to_string()))
            .collect()
    }

    /// Checks structural invariants.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.phases.is_empty() {
            return Err(FlowError::invalid(&self.id, "a flow needs at least one phase"));
        }

        for (index, phase) in self.phases.iter().enumerate() {
            let expected = index as u32 + 1;
            if phase.id != expected {
                return Err(FlowError::invalid(
                    &self.id,
                    format!("phase ids must be 1..N in order; found {} at position {}", phase.id, expected),
                ));
            }
            if phase.steps.is_empty() {
                return Err(FlowError::invalid(&self.id, format!("phase {} has no steps", phase.id)));
            }
        }

        let mut seen = HashSet::new();
        for phase in &self.phases {
            for step in &phase.steps {
                if !seen.insert(step.id.as_str()) {
                    return Err(FlowError::invalid(&self.id, format!("duplicate step id '{}'", step.id)));
                }
                match StepPointer::parse(&step.id) {
                    Some(pointer) if pointer.phase() == phase.id => {}
                    _ => {
                        return Err(FlowError::invalid(
                            &self.id,
                            format!("step '{}' must be named phase-{}-<name>", step.id, phase.id),
                        ))
                    }
                }
                if let Some(key) = step.kind.state_key() {
                    if key.trim().is_empty() || key.split('.').any(str::is_empty) {
                        return Err(FlowError::invalid(
                            &self.id,
                            format!("step '{}' has an invalid state key", step.id),
                        ));
                    }
                }
                if let StepKind::MultipleChoice { options, .. } = &step.kind {
                    if options.is_empty() {
                        return Err(FlowError::invalid(
                            &self.id,
                            format!("step '{}' has no options", step.id),
                        ));
                    }
                }
            }
        }

        for kind in EmbedKind::ALL {
            if let Some(trigger) = self.embeds.trigger(kind) {
                if trigger.unlock_after_phase == 0 || trigger.unlock_after_phase > self.phase_count() {
                    return Err(FlowError::invalid(
                        &self.id,
                        format!("{} unlocks after phase {} which does not exist", kind, trigger.unlock_after_phase),
                    ));
                }
            }
        }

        if let Some(rule) = &self.qualification {
            if self.embeds.resource(rule.embed).is_none() {
                return Err(FlowError::invalid(
                    &self.id,
                    format!("qualification offers {} but it has no resource", rule.embed),
                ));
            }
        }

        Ok(())
    }
}
