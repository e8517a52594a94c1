//! Prompt composition.

use serde::Serialize;
use std::collections::BTreeMap;

/// Version metadata of a remotely managed prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptVersion {
    pub name: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Where the editable half of a prompt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptSource {
    Remote,
    Fallback,
}

/// Effective system prompt for one agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub system_prompt: String,
    pub version: Option<PromptVersion>,
    pub source: PromptSource,
}

/// Values substituted into `{{name}}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptVariables(BTreeMap<String, String>);

impl PromptVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Substitutes `{{ name }}` placeholders. Unknown placeholders are left as is.
pub fn compile_template(template: &str, variables: &PromptVariables) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let name = after_open[..close].trim();
                match variables.get(name) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after_open[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Joins the code-owned document and the editable prompt.
pub fn compose(code_doc: &str, editable: &str) -> String {
    let code_doc = code_doc.trim();
    let editable = editable.trim();
    match (code_doc.is_empty(), editable.is_empty()) {
        (true, _) => editable.to_string(),
        (false, true) => code_doc.to_string(),
        (false, false) => format!("{}\n\n{}", code_doc, editable),
    }
}

/// Appends the sanitized-context description and recalled memory.
pub fn effective_system_prompt(base: &str, context: &str, memories: &[String]) -> String {
    let mut prompt = base.trim_end().to_string();
    if !context.trim().is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(context.trim_end());
    }
    if !memories.is_empty() {
        prompt.push_str("\n\n## Earlier in your conversations with this visitor\n");
        for memory in memories {
            prompt.push_str("- ");
            prompt.push_str(memory.trim());
            prompt.push('\n');
        }
    }
    prompt
}
