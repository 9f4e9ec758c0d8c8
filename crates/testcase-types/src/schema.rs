//! Boundary validation for model and server payloads
//!
//! Model output and backend responses are dynamic JSON. Everything is checked
//! here once, so rendering and export code only ever sees typed values.
//! Malformed scenarios and test cases are dropped and reported as
//! [`SchemaIssue`]s instead of failing the whole payload.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{AnalysisResult, ApiInfo, DocumentType, Priority, Scenario, TestCase, WebsiteInfo};

const SCENARIO_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "priority",
    "category",
    "preconditions",
    "test_cases",
];

const TEST_CASE_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "steps",
    "expected_result",
    "priority",
    "category",
    "preconditions",
    "test_data",
];

const NO_ITEMS: &[Value] = &[];

/// Payload-level failures that make the whole response unusable
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("expected a JSON object at {0}")]
    NotAnObject(String),

    #[error("missing field `{field}` at {path}")]
    MissingField { path: String, field: String },

    #[error("invalid field `{field}` at {path}: {reason}")]
    InvalidField {
        path: String,
        field: String,
        reason: String,
    },

    #[error("{0}")]
    Reported(String),
}

/// A recoverable problem found while validating a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validated value plus everything that had to be dropped or defaulted
#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub issues: Vec<SchemaIssue>,
}

impl<T> Validated<T> {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate a scenario list. Accepts a bare array or an object with a `scenarios` array.
pub fn parse_scenarios(value: &Value) -> Validated<Vec<Scenario>> {
    let mut issues = Vec::new();

    let items: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("scenarios") {
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => {
                issues.push(SchemaIssue::new("scenarios", "expected an array"));
                NO_ITEMS
            }
            None => {
                issues.push(SchemaIssue::new("scenarios", "missing"));
                NO_ITEMS
            }
        },
        _ => {
            issues.push(SchemaIssue::new("$", "expected an array or object"));
            NO_ITEMS
        }
    };

    let mut scenarios = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let path = format!("scenarios[{}]", index);
        match parse_scenario(item, &path, &mut issues) {
            Ok(scenario) => scenarios.push(scenario),
            Err(issue) => issues.push(issue),
        }
    }

    Validated {
        value: scenarios,
        issues,
    }
}

fn parse_scenario(
    value: &Value,
    path: &str,
    issues: &mut Vec<SchemaIssue>,
) -> Result<Scenario, SchemaIssue> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaIssue::new(path, "scenario is not an object"))?;

    if let Some(message) = obj.get("error").and_then(Value::as_str) {
        return Err(SchemaIssue::new(path, format!("model reported: {}", message)));
    }

    let title = required_text(obj, "title")
        .ok_or_else(|| SchemaIssue::new(path, "scenario has no title"))?;

    let test_cases = match obj.get("test_cases") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let case_path = format!("{}.test_cases[{}]", path, index);
                parse_test_case(item, &case_path)
                    .map_err(|issue| issues.push(issue))
                    .ok()
            })
            .collect(),
        Some(_) => {
            issues.push(SchemaIssue::new(
                format!("{}.test_cases", path),
                "expected an array, treating as empty",
            ));
            Vec::new()
        }
    };

    Ok(Scenario {
        id: optional_id(obj),
        title,
        description: text_or_default(obj, "description"),
        priority: priority(obj),
        category: text_or_default(obj, "category"),
        preconditions: string_list(obj.get("preconditions")),
        test_cases,
        extra: extra_fields(obj, SCENARIO_FIELDS),
    })
}

fn parse_test_case(value: &Value, path: &str) -> Result<TestCase, SchemaIssue> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaIssue::new(path, "test case is not an object"))?;

    let title = required_text(obj, "title")
        .ok_or_else(|| SchemaIssue::new(path, "test case has no title"))?;

    Ok(TestCase {
        id: optional_id(obj),
        title,
        description: text_or_default(obj, "description"),
        steps: string_list(obj.get("steps")),
        expected_result: match obj.get("expected_result") {
            Some(Value::Array(parts)) => parts.iter().map(value_text).collect::<Vec<_>>().join("; "),
            Some(other) => value_text(other),
            None => String::new(),
        },
        priority: priority(obj),
        category: text_or_default(obj, "category"),
        preconditions: string_list(obj.get("preconditions")),
        test_data: test_data(obj.get("test_data")),
        extra: extra_fields(obj, TEST_CASE_FIELDS),
    })
}

/// Validate a complete backend response
pub fn parse_analysis_result(value: &Value) -> Result<Validated<AnalysisResult>, SchemaError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemaError::NotAnObject("$".to_string()))?;

    if let Some(message) = obj.get("error").and_then(Value::as_str) {
        if !matches!(obj.get("scenarios"), Some(Value::Array(items)) if !items.is_empty()) {
            return Err(SchemaError::Reported(message.to_string()));
        }
    }

    let Validated {
        value: scenarios,
        mut issues,
    } = parse_scenarios(value);

    let input_type = obj
        .get("input_type")
        .and_then(Value::as_str)
        .map(str::to_string);

    let document_type = match obj.get("document_type").and_then(Value::as_str) {
        Some(raw) => DocumentType::parse(raw).ok_or_else(|| SchemaError::InvalidField {
            path: "$".to_string(),
            field: "document_type".to_string(),
            reason: format!("unknown document type `{}`", raw),
        })?,
        None => {
            issues.push(SchemaIssue::new("document_type", "missing, assuming text"));
            match input_type.as_deref() {
                Some("image") => DocumentType::Image,
                Some("website_url") => DocumentType::Website,
                _ => DocumentType::Text,
            }
        }
    };

    let generated_at = match obj.get("generated_at") {
        Some(Value::String(raw)) => parse_timestamp(raw).ok_or_else(|| SchemaError::InvalidField {
            path: "$".to_string(),
            field: "generated_at".to_string(),
            reason: format!("`{}` is not a timestamp", raw),
        })?,
        _ => {
            return Err(SchemaError::MissingField {
                path: "$".to_string(),
                field: "generated_at".to_string(),
            })
        }
    };

    let api_info = optional_section::<ApiInfo>(obj, "api_info", &mut issues);
    let website_info = optional_section::<WebsiteInfo>(obj, "website_info", &mut issues);

    Ok(Validated {
        value: AnalysisResult {
            scenarios,
            api_info,
            website_info,
            document_type,
            input_type,
            generated_at,
        },
        issues,
    })
}

/// Parse RFC 3339 timestamps, or naive ISO-8601 ones taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn optional_section<T: serde::de::DeserializeOwned>(
    obj: &Map<String, Value>,
    field: &str,
    issues: &mut Vec<SchemaIssue>,
) -> Option<T> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(section) => match serde_json::from_value(section.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                issues.push(SchemaIssue::new(field, format!("dropped: {}", e)));
                None
            }
        },
    }
}

fn required_text(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn text_or_default(obj: &Map<String, Value>, field: &str) -> String {
    obj.get(field).map(value_text).unwrap_or_default()
}

fn optional_id(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn priority(obj: &Map<String, Value>) -> Priority {
    obj.get("priority")
        .and_then(Value::as_str)
        .map(Priority::parse_lenient)
        .unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(value_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn test_data(value: Option<&Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(Value::String(s)) if s.trim().is_empty() => Map::new(),
        Some(Value::String(s)) => {
            let mut map = Map::new();
            map.insert("notes".to_string(), Value::String(s.clone()));
            map
        }
        Some(other) => {
            let mut map = Map::new();
            map.insert("value".to_string(), other.clone());
            map
        }
    }
}

fn extra_fields(obj: &Map<String, Value>, known: &[&str]) -> Map<String, Value> {
    obj.iter()
        .filter(|(key, _)| !known.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
