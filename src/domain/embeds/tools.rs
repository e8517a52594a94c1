//! Embed tools offered to the conversational model.
//!
//! Calling one of these tools performs no side effect. The call is turned into
//! an [`EmbedInvocation`] that the presentation layer renders inline.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::availability::{AvailableEmbeds, EmbedKind};
use super::tool_definition::ToolDefinition;

/// Structured description of an embed the model asked to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedInvocation {
    pub embed_type: EmbedKind,
    pub before_text: String,
    pub after_text: String,
    pub resource_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolCallError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
}

/// One callable embed tool bound to its resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedTool {
    pub kind: EmbedKind,
    pub resource_id: String,
    pub definition: ToolDefinition,
}

impl EmbedTool {
    pub fn tool_name(kind: EmbedKind) -> &'static str {
        match kind {
            EmbedKind::Checkout => "show_checkout",
            EmbedKind::Video => "show_video",
            EmbedKind::Calendly => "show_booking_calendar",
        }
    }

    fn for_kind(kind: EmbedKind, resource_id: &str) -> Self {
        let description = match kind {
            EmbedKind::Checkout => {
                "Show an inline checkout so the visitor can purchase the offer. \
                 Use only when the visitor signals they are ready to buy."
            }
            EmbedKind::Video => {
                "Show an inline video that explains the offer. \
                 Use when the visitor wants to see how it works."
            }
            EmbedKind::Calendly => {
                "Show an inline booking calendar so the visitor can schedule a call. \
                 Use when the visitor wants to talk to a person."
            }
        };

        let definition = ToolDefinition::new(
            Self::tool_name(kind),
            description,
            json!({
                "type": "object",
                "required": ["before_text"],
                "properties": {
                    "before_text": {
                        "type": "string",
                        "description": "Short message shown above the widget"
                    },
                    "after_text": {
                        "type": "string",
                        "description": "Optional message shown below the widget"
                    }
                }
            }),
        );

        Self {
            kind,
            resource_id: resource_id.to_string(),
            definition,
        }
    }

    fn invoke(&self, input: &Value) -> Result<EmbedInvocation, ToolCallError> {
        let before_text = input
            .get("before_text")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ToolCallError::InvalidArguments {
                tool: self.definition.name().to_string(),
                reason: "before_text is required".to_string(),
            })?;
        let after_text = input
            .get("after_text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim();

        Ok(EmbedInvocation {
            embed_type: self.kind,
            before_text: before_text.to_string(),
            after_text: after_text.to_string(),
            resource_id: self.resource_id.clone(),
        })
    }
}

/// Tools offered for one model call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSet {
    tools: Vec<EmbedTool>,
}

impl ToolSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.definition.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&EmbedTool> {
        self.tools.iter().find(|t| t.definition.name() == name)
    }

    /// Resolves a model tool call into an embed description.
    pub fn invoke(&self, name: &str, input: &Value) -> Result<EmbedInvocation, ToolCallError> {
        self.get(name)
            .ok_or_else(|| ToolCallError::UnknownTool(name.to_string()))?
            .invoke(input)
    }
}

/// One tool per available embed.
pub fn build_tools(available: &AvailableEmbeds) -> ToolSet {
    let tools = available
        .kinds()
        .into_iter()
        .filter_map(|kind| {
            available
                .resource(kind)
                .map(|resource| EmbedTool::for_kind(kind, resource))
        })
        .collect();
    ToolSet { tools }
}
