//! Response Parsing
//!
//! Turns raw model text into a JSON object. Models wrap JSON in prose or
//! markdown fences, so the object is located before it is parsed. A parse
//! failure is a `ResponseParse` error and never a reason to switch provider.

use lexbrief_core::{PipelineError, PipelineResult};
use serde_json::{Map, Value};

/// Extract the first JSON object from a text that may contain markdown fences.
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let after_fence = &text[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim());
        }
    }
    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        let after_lang = match after_fence.find('\n') {
            Some(nl) => &after_fence[nl + 1..],
            None => after_fence,
        };
        if let Some(end) = after_lang.find("```") {
            let content = after_lang[..end].trim();
            if content.starts_with('{') {
                return Some(content);
            }
        }
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse raw model output into a JSON object.
pub fn parse_json_object(text: &str) -> PipelineResult<Map<String, Value>> {
    if text.trim().is_empty() {
        return Err(PipelineError::response_parse("empty response"));
    }

    // Whole response first; models often comply exactly
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim()) {
        return Ok(map);
    }

    let candidate = extract_json_object(text)
        .ok_or_else(|| PipelineError::response_parse("no JSON object found in response"))?;

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PipelineError::response_parse(format!(
            "expected a JSON object, found {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(PipelineError::response_parse(format!(
            "invalid JSON: {}",
            e
        ))),
    }
}

/// Read a model-reported confidence. Values on a 0-100 scale are rescaled;
/// anything else outside [0, 1] is rejected.
pub fn read_confidence(value: Option<&Value>) -> Option<f64> {
    let raw = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() || raw < 0.0 {
        None
    } else if raw <= 1.0 {
        Some(raw)
    } else if raw <= 100.0 {
        Some(raw / 100.0)
    } else {
        None
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
