//! What the model sees of an embed tool.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Name, description and input schema of one embed tool.
///
/// The model only ever fills `before_text`/`after_text`; the resource the
/// widget shows is bound server-side when the call is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Messages API `tools[]` entry.
    pub fn to_anthropic_format(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }
}
