//! Answer tree merging.
//!
//! Top-level keys are replaced wholesale, except for the flow's known
//! namespaces, which merge recursively so answers from different steps of the
//! same phase bucket never clobber each other.

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use super::errors::SessionError;
use crate::domain::context::path::nest_at_path;
use crate::domain::flow::Step;

/// Merges `patch` into `answers`.
pub fn merge_answers(answers: &mut Value, patch: Map<String, Value>, namespaces: &BTreeSet<String>) {
    if !answers.is_object() {
        *answers = Value::Object(Map::new());
    }
    let Value::Object(existing) = answers else {
        return;
    };

    for (key, incoming) in patch {
        if namespaces.contains(&key) {
            if let Some(current) = existing.get_mut(&key) {
                deep_merge(current, incoming);
                continue;
            }
        }
        existing.insert(key, incoming);
    }
}

fn deep_merge(current: &mut Value, incoming: Value) {
    match (current, incoming) {
        (Value::Object(current), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match current.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        current.insert(key, value);
                    }
                }
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}

/// Builds the patch for an answer submitted against `step`.
///
/// Question steps always store their answer under their state key. Other steps
/// (and unknown step ids) accept only an object patch.
pub fn answer_patch(step: Option<&Step>, answer: Option<Value>) -> Result<Option<Map<String, Value>>, SessionError> {
    let answer = match answer {
        None | Some(Value::Null) => return Ok(None),
        Some(answer) => answer,
    };

    if let Some(state_key) = step.and_then(|s| s.kind.state_key()) {
        return match nest_at_path(state_key, answer) {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(SessionError::validation("answer", "could not place answer under state key")),
        };
    }

    match answer {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(SessionError::validation(
            "answer",
            "this step has no state key; send an object to merge",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flow::StepKind;
    use proptest::prelude::*;
    use serde_json::json;

    fn namespaces(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn namespaces_merge_deeply() {
        let mut answers = json!({"situation": {"bookingStatus": "open"}});
        merge_answers(
            &mut answers,
            obj(json!({"situation": {"dayRate": "800"}})),
            &namespaces(&["situation"]),
        );
        assert_eq!(answers, json!({"situation": {"bookingStatus": "open", "dayRate": "800"}}));
    }

    #[test]
    fn other_top_level_keys_are_replaced() {
        let mut answers = json!({"contact": {"email": "a@b.co", "phone": "1"}});
        merge_answers(&mut answers, obj(json!({"contact": {"email": "c@d.co"}})), &namespaces(&[]));
        assert_eq!(answers, json!({"contact": {"email": "c@d.co"}}));
    }

    #[test]
    fn merge_into_non_object_starts_fresh() {
        let mut answers = json!(null);
        merge_answers(&mut answers, obj(json!({"a": 1})), &namespaces(&[]));
        assert_eq!(answers, json!({"a": 1}));
    }

    #[test]
    fn question_answer_is_nested_under_state_key() {
        let step = Step {
            id: "phase-1-booking".to_string(),
            kind: StepKind::LongAnswer {
                prompt: "?".to_string(),
                state_key: "situation.dayRate".to_string(),
                placeholder: None,
                personalize: false,
            },
        };
        let patch = answer_patch(Some(&step), Some(json!("800"))).unwrap().unwrap();
        assert_eq!(Value::Object(patch), json!({"situation": {"dayRate": "800"}}));
    }

    #[test]
    fn non_question_step_needs_object() {
        let step = Step {
            id: "phase-1-complete".to_string(),
            kind: StepKind::AiMoment { agent: None, headline: None },
        };
        assert!(answer_patch(Some(&step), Some(json!("x"))).is_err());
        assert!(answer_patch(Some(&step), Some(json!({"seen": true}))).unwrap().is_some());
        assert!(answer_patch(None, Some(json!(3))).is_err());
    }

    #[test]
    fn missing_or_null_answer_is_no_patch() {
        assert_eq!(answer_patch(None, None).unwrap(), None);
        assert_eq!(answer_patch(None, Some(Value::Null)).unwrap(), None);
    }

    fn tree() -> impl Strategy<Value = Map<String, Value>> {
        prop::collection::btree_map(
            "[a-e]",
            prop_oneof![
                "[a-z]{1,4}".prop_map(Value::String),
                prop::collection::btree_map("[x-z]", "[a-z]{1,4}", 0..3)
                    .prop_map(|m| serde_json::to_value(m).unwrap()),
            ],
            0..5,
        )
        .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn keys_outside_patch_namespaces_survive(
            existing in tree(),
            patch in tree(),
            deep in prop::collection::btree_set("[a-e]", 0..3),
        ) {
            let mut answers = Value::Object(existing.clone());
            merge_answers(&mut answers, patch.clone(), &deep);
            let merged = answers.as_object().unwrap();
            for (key, value) in &existing {
                if !patch.contains_key(key) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
        }

        #[test]
        fn deep_namespaces_keep_untouched_children(
            existing in tree(),
            patch in tree(),
        ) {
            let deep: BTreeSet<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
            let mut answers = Value::Object(existing.clone());
            merge_answers(&mut answers, patch.clone(), &deep);
            let merged = answers.as_object().unwrap();
            for (key, value) in &existing {
                if let (Value::Object(before), Some(Value::Object(incoming))) = (value, patch.get(key)) {
                    let after = merged.get(key).and_then(Value::as_object).unwrap();
                    for (child, child_value) in before {
                        if !incoming.contains_key(child) {
                            prop_assert_eq!(after.get(child), Some(child_value));
                        }
                    }
                }
            }
        }
    }
}
