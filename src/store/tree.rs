//! JSON tree operations
//!
//! The store keeps its whole state as one `serde_json::Value`. Objects are
//! interior nodes; everything else is a leaf. Nulls and empty objects are
//! never stored: writing `null` deletes, and parents left empty by a delete
//! are pruned.

use serde_json::{Map, Value};

use super::path::StorePath;

/// Read the value at `path`, `Value::Null` if absent
pub fn get_at(root: &Value, path: &StorePath) -> Value {
    let mut node = root;
    for key in path.segments() {
        match node.get(key) {
            Some(child) => node = child,
            None => return Value::Null,
        }
    }
    node.clone()
}

/// Write `value` at `path`, creating interior objects as needed.
///
/// Scalars sitting where an interior node is required are replaced.
pub fn set_at(root: &mut Value, path: &StorePath, value: Value) {
    let value = normalize(value);

    if path.is_root() {
        *root = value;
        return;
    }

    if value.is_null() {
        remove_at(root, path.segments());
        return;
    }

    let mut node = root;
    for key in path.segments() {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        // Checked just above
        let Value::Object(map) = node else { unreachable!() };
        node = map.entry(key.clone()).or_insert(Value::Null);
    }
    *node = value;
}

/// Remove the node at `segments`, pruning parents that become empty.
/// Returns true if the parent object is now empty.
fn remove_at(node: &mut Value, segments: &[String]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };
    let Value::Object(map) = node else {
        return false;
    };

    if rest.is_empty() {
        map.remove(first);
    } else if let Some(child) = map.get_mut(first) {
        if remove_at(child, rest) {
            map.remove(first);
        }
    }

    map.is_empty()
}

/// Strip nulls and empty objects so the stored tree has a canonical shape
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        other => other,
    }
}

/// Keys of an object node in store order; empty for leaves
pub fn child_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}
