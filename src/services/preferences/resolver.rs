//! Preference Resolver
//!
//! Merges stored overrides into the compiled defaults, option by option.
//! Unknown options, wrong types and out-of-range values are ignored with a
//! warning; the option keeps its default. The result is a frozen snapshot.

use serde_json::Value;
use tracing::warn;

use super::types::PreferenceSet;

/// Resolve stored overrides into a complete preference set.
pub fn resolve(overrides: &Value) -> PreferenceSet {
    resolve_with_report(overrides).0
}

/// The compiled defaults.
pub fn reset() -> PreferenceSet {
    PreferenceSet::default()
}

/// Resolve and also return a description of every override that was ignored.
pub fn resolve_with_report(overrides: &Value) -> (PreferenceSet, Vec<String>) {
    let defaults = PreferenceSet::default();
    let mut ignored = Vec::new();

    let Ok(mut merged) = serde_json::to_value(&defaults) else {
        return (defaults, ignored);
    };

    let mut leaves = Vec::new();
    match overrides {
        Value::Null => {}
        Value::Object(_) => collect_leaves(&merged, overrides, "", &mut leaves, &mut ignored),
        _ => ignored.push("overrides: expected an object".to_string()),
    }

    for (pointer, value) in leaves {
        let mut candidate = merged.clone();
        let Some(slot) = candidate.pointer_mut(&pointer) else {
            ignored.push(format!("{}: unknown option", display_path(&pointer)));
            continue;
        };
        *slot = value;

        match serde_json::from_value::<PreferenceSet>(candidate.clone()) {
            Ok(set) => match set.validate() {
                Ok(()) => merged = candidate,
                Err(reason) => ignored.push(format!("{}: {}", display_path(&pointer), reason)),
            },
            Err(e) => ignored.push(format!("{}: invalid value ({})", display_path(&pointer), e)),
        }
    }

    for message in &ignored {
        warn!(override_ignored = %message, "Ignoring preference override");
    }

    let resolved = serde_json::from_value(merged).unwrap_or(defaults);
    (resolved, ignored)
}

/// Walk the override tree alongside the defaults, collecting leaf overrides
/// as JSON pointers. Nested objects merge key by key.
fn collect_leaves(
    default_node: &Value,
    override_node: &Value,
    pointer: &str,
    leaves: &mut Vec<(String, Value)>,
    ignored: &mut Vec<String>,
) {
    match (default_node, override_node) {
        (Value::Object(defaults), Value::Object(overrides)) => {
            for (key, value) in overrides {
                let child = format!("{}/{}", pointer, key);
                match defaults.get(key) {
                    Some(default_child) => {
                        collect_leaves(default_child, value, &child, leaves, ignored)
                    }
                    None => ignored.push(format!("{}: unknown option", display_path(&child))),
                }
            }
        }
        (Value::Object(_), _) => {
            ignored.push(format!("{}: expected an object", display_path(pointer)));
        }
        _ => leaves.push((pointer.to_string(), override_node.clone())),
    }
}

fn display_path(pointer: &str) -> String {
    pointer.trim_start_matches('/').replace('/', ".")
}
