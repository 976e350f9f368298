//! Payload Validation
//!
//! Structural checks on model output. Missing fields are filled with
//! placeholders, array fields are coerced to arrays, and the model's own
//! confidence is combined with field completeness. Every repair is reported
//! as a validation error; nothing here rejects a payload outright.

use lexbrief_core::{has_content, value_text};
use serde_json::{Map, Value};

use crate::models::settings::ScoringConfig;
use crate::services::gateway::read_confidence;
use crate::utils::text::word_count;

pub use lexbrief_core::{citation_strings, NOT_FOUND};

/// Expected shape of a model-produced payload.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    /// Fields (required or optional) that hold arrays
    pub arrays: &'static [&'static str],
    /// Keys the model may report its confidence under, first match wins
    pub confidence_keys: &'static [&'static str],
}

impl FieldSchema {
    fn is_array(&self, field: &str) -> bool {
        self.arrays.contains(&field)
    }
}

pub const EXTRACTION_SCHEMA: FieldSchema = FieldSchema {
    required: &[
        "case_name",
        "court",
        "date",
        "facts",
        "legal_issues",
        "holdings",
        "reasoning",
    ],
    optional: &["judges", "case_number", "citations", "disposition"],
    arrays: &["judges", "legal_issues", "holdings", "reasoning", "citations"],
    confidence_keys: &["confidence"],
};

pub const BRIEF_SCHEMA: FieldSchema = FieldSchema {
    required: &["issue", "facts", "holding", "reasoning"],
    optional: &["key_citations"],
    arrays: &["reasoning", "key_citations"],
    confidence_keys: &["confidence_score", "confidence"],
};

/// A repaired payload and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayload {
    pub payload: Value,
    pub confidence: f64,
    pub errors: Vec<String>,
}

/// Check and repair `raw` against `schema`, then score it.
pub fn validate_payload(
    mut raw: Map<String, Value>,
    schema: &FieldSchema,
    scoring: &ScoringConfig,
) -> ValidatedPayload {
    let mut errors = Vec::new();
    let mut complete = 0usize;

    for &field in schema.required {
        let present = repair_field(&mut raw, field, schema.is_array(field), &mut errors);
        if present {
            complete += 1;
        } else {
            errors.push(format!("missing required field '{}'", field));
        }
    }
    for &field in schema.optional {
        repair_field(&mut raw, field, schema.is_array(field), &mut errors);
    }

    let model_confidence = take_confidence(&mut raw, schema.confidence_keys, &mut errors);
    let completeness = if schema.required.is_empty() {
        1.0
    } else {
        complete as f64 / schema.required.len() as f64
    };

    ValidatedPayload {
        payload: Value::Object(raw),
        confidence: scoring.combine(model_confidence, completeness),
        errors,
    }
}

/// Normalize one field in place. Returns whether it carried real content.
fn repair_field(
    map: &mut Map<String, Value>,
    field: &str,
    is_array: bool,
    errors: &mut Vec<String>,
) -> bool {
    let value = map.remove(field).unwrap_or(Value::Null);

    let (repaired, present) = if is_array {
        match value {
            Value::Null => (Value::Array(Vec::new()), false),
            Value::Array(items) => {
                let present = items.iter().any(has_content);
                (Value::Array(items), present)
            }
            scalar => {
                errors.push(format!(
                    "field '{}' should be an array; coerced to a one-element array",
                    field
                ));
                let present = has_content(&scalar);
                (Value::Array(vec![scalar]), present)
            }
        }
    } else {
        match value {
            Value::Null => (Value::String(NOT_FOUND.to_string()), false),
            Value::String(s) => {
                let present = has_content(&Value::String(s.clone()));
                let s = if s.trim().is_empty() {
                    NOT_FOUND.to_string()
                } else {
                    s
                };
                (Value::String(s), present)
            }
            Value::Array(items) => {
                errors.push(format!(
                    "field '{}' should be a string; array joined",
                    field
                ));
                let joined = items
                    .iter()
                    .map(value_text)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join("; ");
                let present = !joined.is_empty();
                let text = if present { joined } else { NOT_FOUND.to_string() };
                (Value::String(text), present)
            }
            other => {
                let present = has_content(&other);
                (Value::String(value_text(&other)), present)
            }
        }
    };

    map.insert(field.to_string(), repaired);
    present
}

/// Read and rescale the model-reported confidence, writing the rescaled
/// value back. Unusable values are removed and flagged.
fn take_confidence(
    map: &mut Map<String, Value>,
    keys: &[&str],
    errors: &mut Vec<String>,
) -> Option<f64> {
    let key = keys.iter().find(|k| map.contains_key(**k))?;
    match read_confidence(map.get(*key)) {
        Some(confidence) => {
            if let Some(number) = serde_json::Number::from_f64(confidence) {
                map.insert(key.to_string(), Value::Number(number));
            }
            Some(confidence)
        }
        None => {
            let raw = map.remove(*key).unwrap_or(Value::Null);
            if !raw.is_null() {
                errors.push(format!(
                    "confidence '{}' out of range; ignored",
                    value_text(&raw)
                ));
            }
            None
        }
    }
}

/// Set `word_count` on a brief payload when the model left it out or zero.
pub fn fill_word_count(payload: &mut Value) {
    let Some(map) = payload.as_object_mut() else {
        return;
    };
    if map.get("word_count").and_then(|v| v.as_u64()).unwrap_or(0) > 0 {
        return;
    }
    let count: usize = ["issue", "facts", "holding", "reasoning"]
        .iter()
        .filter_map(|field| map.get(*field))
        .map(|value| match value {
            Value::Array(items) => items
                .iter()
                .map(|v| word_count(&value_text(v)))
                .sum::<usize>(),
            other => word_count(&value_text(other)),
        })
        .sum();
    map.insert("word_count".to_string(), Value::from(count));
}
