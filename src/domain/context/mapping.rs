//! Flow-specific context mapping rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output-path to input-path pairs used to project answers into agent context.
///
/// Output paths are the domain words an agent sees (`situation.bookingStatus`).
/// Input paths address the raw answer tree. `notes` optionally describes an
/// output field for the data-access document handed to agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMapping {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub notes: BTreeMap<String, String>,
}

impl ContextMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule mapping `input` to `output`.
    pub fn map(mut self, output: impl Into<String>, input: impl Into<String>) -> Self {
        self.fields.insert(output.into(), input.into());
        self
    }

    /// Attaches a human description to an output field.
    pub fn describe(mut self, output: impl Into<String>, note: impl Into<String>) -> Self {
        self.notes.insert(output.into(), note.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates `(output, input)` pairs in output-path order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(o, i)| (o.as_str(), i.as_str()))
    }

    pub fn note_for(&self, output: &str) -> Option<&str> {
        self.notes.get(output).map(String::as_str)
    }

    /// Output paths an agent restricted to `allowed` prefixes may see.
    ///
    /// An empty allow-list means every mapped output.
    pub fn visible_outputs<'a>(&'a self, allowed: &'a [String]) -> impl Iterator<Item = &'a str> {
        self.fields.keys().map(String::as_str).filter(move |output| {
            allowed.is_empty()
                || allowed
                    .iter()
                    .any(|prefix| output == prefix || output.starts_with(&format!("{}.", prefix)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_yaml() {
        let yaml = r#"
fields:
  situation.bookingStatus: phase1.booking
notes:
  situation.bookingStatus: How far ahead the visitor is booked
"#;
        let mapping: ContextMapping = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            mapping.fields.get("situation.bookingStatus"),
            Some(&"phase1.booking".to_string())
        );
        assert!(mapping.note_for("situation.bookingStatus").is_some());
    }

    #[test]
    fn visible_outputs_respects_prefixes() {
        let mapping = ContextMapping::new()
            .map("situation.bookingStatus", "a")
            .map("situationality", "b")
            .map("goals.ninetyDay", "c");

        let allowed = vec!["situation".to_string()];
        let visible: Vec<&str> = mapping.visible_outputs(&allowed).collect();
        assert_eq!(visible, vec!["situation.bookingStatus"]);

        let all: Vec<&str> = mapping.visible_outputs(&[]).collect();
        assert_eq!(all.len(), 3);
    }
}
