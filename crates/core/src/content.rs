//! Payload Content Rules
//!
//! What counts as real content in model output. Planning, skip checks and
//! citation normalization all read extracted fields through these helpers so
//! they agree on what "no citations" means.

use serde_json::Value;

/// Placeholder models write for a field they could not find.
pub const NOT_FOUND: &str = "Not found";

/// True unless the value is empty or the "Not found" placeholder.
pub fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => {
            let s = s.trim();
            !s.is_empty() && !s.eq_ignore_ascii_case(NOT_FOUND)
        }
        Value::Array(items) => items.iter().any(has_content),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Plain text of a scalar; strings are trimmed, null is empty.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Citations of an extraction payload as plain strings.
///
/// Blanks and placeholders are dropped. A bare string is read as a
/// one-element list.
pub fn citation_strings(extraction: &Value) -> Vec<String> {
    match extraction.get("citations") {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| has_content(v))
            .map(value_text)
            .collect(),
        Some(single) if has_content(single) && !single.is_object() => vec![value_text(single)],
        _ => Vec::new(),
    }
}
