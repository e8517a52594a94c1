//! Code-owned description of the data an agent may reference.
//!
//! Generated from the flow's context mapping, so the editable part of a prompt
//! never has to describe (and can never drift from) the context schema.

use std::fmt::Write;

use super::config::AgentConfig;
use crate::domain::context::ContextMapping;

/// Builds the data-access document for `agent` under `mapping`.
pub fn data_access_doc(agent: &AgentConfig, mapping: Option<&ContextMapping>) -> String {
    let mut doc = String::from("## Visitor data you can use\n");
    doc.push_str(
        "The visitor context may contain the fields below and nothing else. \
         A missing field means the visitor did not provide it; do not guess or \
         invent values, and never mention field names to the visitor.\n",
    );
    doc.push_str("- firstName: the visitor's first name\n");

    if let Some(mapping) = mapping {
        for output in mapping.visible_outputs(&agent.context_fields) {
            match mapping.note_for(output) {
                Some(note) => {
                    let _ = writeln!(doc, "- {}: {}", output, note);
                }
                None => {
                    let _ = writeln!(doc, "- {}", output);
                }
            }
        }
    }
    doc
}
