use serde_json::{Map, Value};

use crate::models::domain::CandidateError;

/// Keys that belong to schema descriptions rather than question objects.
/// Models sometimes echo them back from the format instructions.
const SCHEMA_METADATA_KEYS: [&str; 4] = ["model_config", "$schema", "$defs", "definitions"];

/// Parses raw model text into a JSON object.
///
/// Accepts a bare object, an object inside a markdown code fence, or an object
/// surrounded by prose (the first balanced top-level object wins). Anything
/// else fails closed.
pub fn parse_candidate(raw: &str) -> Result<Map<String, Value>, CandidateError> {
    let text = strip_code_fence(raw.trim());

    let slice = match serde_json::from_str::<Value>(text) {
        Ok(value) => return into_object(value),
        Err(_) => first_object_slice(text)
            .ok_or_else(|| CandidateError::Parse("no JSON object found in response".to_string()))?,
    };

    let value = serde_json::from_str::<Value>(slice).map_err(|e| CandidateError::Parse(e.to_string()))?;
    into_object(value)
}

pub fn strip_schema_metadata(candidate: &mut Map<String, Value>) {
    for key in SCHEMA_METADATA_KEYS {
        candidate.remove(key);
    }
}

fn into_object(value: Value) -> Result<Map<String, Value>, CandidateError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CandidateError::Parse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the language tag line, e.g. ```json
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Byte range of the first balanced `{...}` at top level, ignoring braces
/// inside string literals.
fn first_object_slice(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
