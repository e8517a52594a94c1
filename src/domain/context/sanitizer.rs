//! Projection of raw session answers into agent-safe context.
//!
//! Only mapped paths survive. Everything else in the answer tree (step keys,
//! phase buckets, scratch fields) is dropped, and empty leaves are pruned so
//! agents never see placeholder noise.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::Write;

use super::mapping::ContextMapping;
use super::path::{get_path, is_empty_value, prune_empty, set_path};

/// Request-scoped, relabeled view of a session's answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SanitizedContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.fields.is_empty()
    }

    /// Looks up a sanitized field by its output path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let node = self.fields.get(head)?;
        match rest {
            Some(rest) => get_path(node, rest),
            None => Some(node),
        }
    }

    /// Keeps only fields under the `allowed` output prefixes.
    ///
    /// An empty allow-list keeps everything.
    pub fn restricted_to(self, allowed: &[String]) -> Self {
        if allowed.is_empty() {
            return self;
        }
        let mut kept = Value::Object(Map::new());
        for prefix in allowed {
            if let Some(value) = self.get(prefix) {
                set_path(&mut kept, prefix, value.clone());
            }
        }
        let fields = match kept {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            first_name: self.first_name,
            fields,
        }
    }

    /// Renders the context as an indented list for prompt injection.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::from("## What you know about this visitor\n");
        if let Some(name) = &self.first_name {
            let _ = writeln!(out, "- firstName: {}", name);
        }
        for (key, value) in &self.fields {
            render_node(&mut out, key, value, 0);
        }
        out
    }
}

/// Applies `mapping` to `answers`.
///
/// A missing mapping yields an empty context apart from the first name.
pub fn sanitize(
    mapping: Option<&ContextMapping>,
    answers: &Value,
    first_name: Option<&str>,
) -> SanitizedContext {
    let first_name = first_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let Some(mapping) = mapping else {
        return SanitizedContext {
            first_name,
            fields: Map::new(),
        };
    };

    let mut projected = Value::Object(Map::new());
    for (output, input) in mapping.rules() {
        if let Some(value) = get_path(answers, input) {
            if !is_empty_value(value) {
                set_path(&mut projected, output, value.clone());
            }
        }
    }

    let fields = match prune_empty(projected) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    SanitizedContext { first_name, fields }
}

fn render_node(out: &mut String, key: &str, value: &Value, depth: usize) {
    let indent = "  ".repeat(depth);
    match value {
        Value::Object(map) => {
            let _ = writeln!(out, "{}- {}:", indent, key);
            for (child_key, child) in map {
                render_node(out, child_key, child, depth + 1);
            }
        }
        Value::Array(items) => {
            let joined: Vec<String> = items.iter().map(render_scalar).collect();
            let _ = writeln!(out, "{}- {}: {}", indent, key, joined.join(", "));
        }
        other => {
            let _ = writeln!(out, "{}- {}: {}", indent, key, render_scalar(other));
        }
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn booking_mapping() -> ContextMapping {
        ContextMapping::new()
            .map("situation.bookingStatus", "situation.bookingStatus")
            .map("situation.dayRate", "situation.dayRate")
    }

    #[test]
    fn empty_day_rate_is_pruned() {
        let raw = json!({"situation": {"bookingStatus": "booked-1-month", "dayRate": ""}});
        let ctx = sanitize(Some(&booking_mapping()), &raw, None);
        assert_eq!(
            Value::Object(ctx.fields),
            json!({"situation": {"bookingStatus": "booked-1-month"}})
        );
    }

    #[test]
    fn restriction_keeps_allowed_prefixes_only() {
        let mapping = booking_mapping().map("goals.ninetyDay", "goals.ninetyDay");
        let raw = json!({
            "situation": {"bookingStatus": "open", "dayRate": "700"},
            "goals": {"ninetyDay": "Two retainers"}
        });
        let ctx = sanitize(Some(&mapping), &raw, Some("Sam"))
            .restricted_to(&["situation.dayRate".to_string()]);

        assert_eq!(Value::Object(ctx.fields), json!({"situation": {"dayRate": "700"}}));
        assert_eq!(ctx.first_name.as_deref(), Some("Sam"));
    }

    #[test]
    fn unmapped_paths_are_dropped() {
        let raw = json!({
            "situation": {"bookingStatus": "booked"},
            "phase1": {"internalStepKey": "q3"}
        });
        let ctx = sanitize(Some(&booking_mapping()), &raw, None);
        assert!(ctx.get("phase1").is_none());
        assert_eq!(ctx.get("situation.bookingStatus"), Some(&json!("booked")));
    }

    #[test]
    fn relabels_input_paths() {
        let mapping = ContextMapping::new().map("goals.target", "phase3.q1");
        let raw = json!({"phase3": {"q1": "Raise rates"}});
        let ctx = sanitize(Some(&mapping), &raw, None);
        assert_eq!(Value::Object(ctx.fields), json!({"goals": {"target": "Raise rates"}}));
    }

    #[test]
    fn missing_mapping_gives_empty_context() {
        let raw = json!({"situation": {"bookingStatus": "booked"}});
        let ctx = sanitize(None, &raw, None);
        assert!(ctx.is_empty());
    }

    #[test]
    fn first_name_is_trimmed_and_blank_dropped() {
        let ctx = sanitize(None, &json!({}), Some("  Sam "));
        assert_eq!(ctx.first_name.as_deref(), Some("Sam"));

        let ctx = sanitize(None, &json!({}), Some("   "));
        assert!(ctx.first_name.is_none());
    }

    #[test]
    fn serializes_first_name_alongside_fields() {
        let ctx = sanitize(
            Some(&booking_mapping()),
            &json!({"situation": {"bookingStatus": "open"}}),
            Some("Ada"),
        );
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(
            value,
            json!({"firstName": "Ada", "situation": {"bookingStatus": "open"}})
        );
    }

    #[test]
    fn describe_renders_nested_fields() {
        let mapping = ContextMapping::new()
            .map("situation.bookingStatus", "a")
            .map("obstacles.list", "b");
        let raw = json!({"a": "booked-1-month", "b": ["pricing", "leads"]});
        let text = sanitize(Some(&mapping), &raw, Some("Sam")).describe();

        assert!(text.contains("- firstName: Sam"));
        assert!(text.contains("- situation:\n  - bookingStatus: booked-1-month"));
        assert!(text.contains("  - list: pricing, leads"));
    }

    #[test]
    fn describe_is_empty_for_empty_context() {
        assert_eq!(SanitizedContext::empty().describe(), "");
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            Just(json!("")),
            "[a-z]{1,6}".prop_map(Value::String),
            any::<i32>().prop_map(|n| json!(n)),
        ]
    }

    fn answers() -> impl Strategy<Value = Value> {
        prop::collection::btree_map("[a-c]", prop::collection::btree_map("[x-z]", leaf(), 0..3), 0..3)
            .prop_map(|outer| serde_json::to_value(outer).unwrap())
    }

    fn mapping() -> impl Strategy<Value = ContextMapping> {
        prop::collection::btree_map("[p-r]\\.[s-u]", "[a-c]\\.[x-z]", 0..5).prop_map(|fields| {
            ContextMapping {
                fields,
                notes: Default::default(),
            }
        })
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(raw in answers(), mapping in mapping()) {
            let first = sanitize(Some(&mapping), &raw, Some("Sam"));
            let second = sanitize(Some(&mapping), &raw, Some("Sam"));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn present_inputs_appear_and_empty_inputs_do_not(raw in answers(), mapping in mapping()) {
            let ctx = sanitize(Some(&mapping), &raw, None);
            for (output, input) in mapping.rules() {
                match get_path(&raw, input) {
                    Some(value) if !is_empty_value(value) => {
                        prop_assert_eq!(ctx.get(output), Some(value));
                    }
                    _ => prop_assert!(ctx.get(output).is_none()),
                }
            }
        }
    }
}
