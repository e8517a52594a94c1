//! Agent configuration for every AI capability in a funnel.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::AgentId;

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// What an agent is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPurpose {
    /// Free-form conversation after (or during) the flow.
    Chat,
    /// Personalized reflection at the end of a phase.
    Relief,
    /// Written diagnosis of the visitor's situation.
    Diagnosis,
    /// Rewording upcoming questions for this visitor.
    Personalization,
    /// Deciding whether to offer a call.
    Qualification,
}

/// Configuration for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub id: AgentId,
    pub purpose: AgentPurpose,
    /// Provider model id. `None` uses the provider default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Name of the editable prompt in the remote prompt store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_name: Option<String>,
    /// Prompt used when the remote store has nothing usable.
    pub fallback_prompt: String,
    /// Output-path prefixes this agent may reference. Empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_fields: Vec<String>,
    /// Phase a relief agent speaks for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<u32>,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl AgentConfig {
    pub fn new(id: AgentId, purpose: AgentPurpose, fallback_prompt: impl Into<String>) -> Self {
        Self {
            id,
            purpose,
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            prompt_name: None,
            fallback_prompt: fallback_prompt.into(),
            context_fields: Vec::new(),
            phase: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_limits(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn with_prompt_name(mut self, name: impl Into<String>) -> Self {
        self.prompt_name = Some(name.into());
        self
    }

    pub fn with_context_fields(mut self, fields: Vec<String>) -> Self {
        self.context_fields = fields;
        self
    }

    pub fn for_phase(mut self, phase: u32) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Remote prompt key; defaults to the agent id.
    pub fn prompt_key(&self) -> &str {
        self.prompt_name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Built-in agents every flow gets unless it overrides them.
pub fn default_agents() -> Vec<AgentConfig> {
    vec![
        chat_agent(),
        diagnosis_agent(),
        personalization_agent(),
        qualification_agent(),
    ]
}

/// Relief agent used for a phase the flow leaves unconfigured.
pub fn default_relief_agent(phase: u32, phase_name: &str) -> AgentConfig {
    AgentConfig::new(
        AgentId::relief_for_phase(phase),
        AgentPurpose::Relief,
        format!(
            "The visitor just finished the \"{}\" part of a short guided questionnaire. \
             Write two or three warm sentences that reflect back what they shared, \
             name one thing that is already working for them, and tell them the next \
             part will build on it. Address them by first name if you know it. \
             Never mention questions, steps or sections by number.",
            phase_name
        ),
    )
    .with_limits(300, 0.8)
    .for_phase(phase)
}

fn chat_agent() -> AgentConfig {
    AgentConfig::new(
        AgentId::from_static("chat"),
        AgentPurpose::Chat,
        "You are a friendly, practical guide. The visitor has been answering questions \
         about their situation and now wants to talk it through. Keep answers short and \
         specific to what they told you. When they are ready for a next step, offer the \
         relevant widget with a tool call instead of pasting links.",
    )
    .with_limits(800, 0.7)
}

fn diagnosis_agent() -> AgentConfig {
    AgentConfig::new(
        AgentId::from_static("diagnosis"),
        AgentPurpose::Diagnosis,
        "Write a short diagnosis of the visitor's situation in plain language. \
         Start with what is working, then the single biggest thing holding them back, \
         then one concrete move for the next 30 days.",
    )
    .with_limits(900, 0.6)
}

fn personalization_agent() -> AgentConfig {
    AgentConfig::new(
        AgentId::from_static("personalize"),
        AgentPurpose::Personalization,
        "Rewrite the next question so it speaks to this visitor's situation. \
         Keep its meaning and answer options unchanged. Reply with the question only.",
    )
    .with_limits(200, 0.5)
}

fn qualification_agent() -> AgentConfig {
    AgentConfig::new(
        AgentId::from_static("qualification"),
        AgentPurpose::Qualification,
        "Summarize in two sentences why a short call would help this visitor, \
         based only on what they shared.",
    )
    .with_limits(300, 0.4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_defaults() {
        let yaml = r#"
id: chat
purpose: chat
fallback_prompt: Be helpful.
"#;
        let agent: AgentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(agent.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(agent.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(agent.prompt_key(), "chat");
    }

    #[test]
    fn prompt_key_prefers_prompt_name() {
        let agent = AgentConfig::new(AgentId::new("chat").unwrap(), AgentPurpose::Chat, "x")
            .with_prompt_name("funnel/chat");
        assert_eq!(agent.prompt_key(), "funnel/chat");
    }

    #[test]
    fn default_agents_cover_every_non_relief_purpose() {
        let purposes: Vec<AgentPurpose> = default_agents().iter().map(|a| a.purpose).collect();
        assert!(purposes.contains(&AgentPurpose::Chat));
        assert!(purposes.contains(&AgentPurpose::Diagnosis));
        assert!(purposes.contains(&AgentPurpose::Personalization));
        assert!(purposes.contains(&AgentPurpose::Qualification));
    }

    #[test]
    fn default_relief_agent_is_bound_to_phase() {
        let agent = default_relief_agent(2, "Obstacles");
        assert_eq!(agent.id.as_str(), "relief-phase-2");
        assert_eq!(agent.phase, Some(2));
        assert!(agent.fallback_prompt.contains("Obstacles"));
    }
}
