//! Dot-path traversal over JSON answer trees.
//!
//! Paths are dot separated object keys (`situation.bookingStatus`). Arrays are
//! treated as leaves; there is no index syntax.

use serde_json::{Map, Value};

/// Reads the value at `path`. Missing intermediate nodes yield `None`.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        _ => None,
    })
}

/// Writes `value` at `path`, creating intermediate objects as needed.
///
/// A non-object node sitting on the path is replaced by an object.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut node = root;
    for segment in parents {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(last.to_string(), value);
}

/// Wraps `value` so it sits at `path` inside a fresh object.
pub fn nest_at_path(path: &str, value: Value) -> Value {
    let mut root = Value::Object(Map::new());
    set_path(&mut root, path, value);
    root
}

/// True for null, empty strings (after trimming), empty arrays and empty objects.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Recursively strips empty leaves and the subtrees they leave behind.
///
/// Returns `None` when the whole value prunes away.
pub fn prune_empty(value: Value) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(key, child)| prune_empty(child).map(|child| (key, child)))
                .collect();
            (!pruned.is_empty()).then_some(Value::Object(pruned))
        }
        Value::Array(items) => {
            let pruned: Vec<Value> = items.into_iter().filter_map(prune_empty).collect();
            (!pruned.is_empty()).then_some(Value::Array(pruned))
        }
        other if is_empty_value(&other) => None,
        other => Some(other),
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}
