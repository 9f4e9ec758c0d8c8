//! Recovery of JSON from free-form model output

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::EngineError;

const PREVIEW_CHARS: usize = 500;

lazy_static! {
    static ref OBJECT_SPAN: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
    static ref ARRAY_SPAN: Regex = Regex::new(r"(?s)\[.*\]").unwrap();
}

/// Parse model output as JSON.
///
/// Tries the whole text, then the outermost `{...}` span, then the outermost
/// `[...]` span, which is wrapped as `{"scenarios": [...]}`.
pub fn recover_json(content: &str) -> Result<Value, EngineError> {
    let content = content.trim();

    if let Ok(value) = serde_json::from_str::<Value>(content) {
        return Ok(value);
    }
    debug!("Model output is not plain JSON, trying embedded spans");

    if let Some(span) = OBJECT_SPAN.find(content) {
        if let Ok(value) = serde_json::from_str::<Value>(span.as_str()) {
            return Ok(value);
        }
    }

    if let Some(span) = ARRAY_SPAN.find(content) {
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(span.as_str()) {
            return Ok(json!({ "scenarios": items }));
        }
    }

    Err(EngineError::UnparseableResponse(
        content.chars().take(PREVIEW_CHARS).collect(),
    ))
}

/// Like [`recover_json`] but always yields the scenario array.
///
/// A bare array answer is taken as the scenario list itself.
pub fn recover_scenarios(content: &str) -> Result<Value, EngineError> {
    match recover_json(content)? {
        Value::Array(items) => Ok(Value::Array(items)),
        Value::Object(mut obj) => match obj.remove("scenarios") {
            Some(scenarios @ Value::Array(_)) => Ok(scenarios),
            _ => match obj.get("error").and_then(Value::as_str) {
                Some(message) => Err(EngineError::Llm(message.to_string())),
                None => Err(EngineError::UnparseableResponse(
                    "response has no scenarios array".to_string(),
                )),
            },
        },
        other => Err(EngineError::UnparseableResponse(
            other.to_string().chars().take(PREVIEW_CHARS).collect(),
        )),
    }
}
