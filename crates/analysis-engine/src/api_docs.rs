//! Swagger/OpenAPI and Postman document parsing

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::EngineError;

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiDocumentKind {
    Swagger,
    Postman,
}

impl ApiDocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiDocumentKind::Swagger => "swagger",
            ApiDocumentKind::Postman => "postman",
        }
    }
}

/// One operation described by the document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiEndpoint {
    pub path: String,
    pub method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Remaining document-specific fields (parameters, responses, headers, body...)
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiDocument {
    pub kind: ApiDocumentKind,
    pub title: String,
    pub version: String,
    pub description: String,
    pub host: String,
    pub base_path: String,
    pub schemes: Vec<String>,
    pub endpoints: Vec<ApiEndpoint>,
}

impl Serialize for ApiDocumentKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Decide whether `doc` is a Postman collection or a Swagger/OpenAPI spec
pub fn detect(doc: &Value) -> Result<ApiDocumentKind, EngineError> {
    let has_info_name = doc
        .get("info")
        .and_then(|info| info.get("name"))
        .is_some();
    let is_swagger = doc.get("swagger").is_some() || doc.get("openapi").is_some();

    if has_info_name && doc.get("item").is_some() {
        return Ok(ApiDocumentKind::Postman);
    }
    if is_swagger {
        return Ok(ApiDocumentKind::Swagger);
    }
    if doc.get("item").map_or(false, Value::is_array) {
        return Ok(ApiDocumentKind::Postman);
    }
    Err(EngineError::UnknownDocument)
}

/// Parse uploaded bytes into a document summary
pub fn parse_document(bytes: &[u8]) -> Result<ApiDocument, EngineError> {
    let doc: Value = serde_json::from_slice(bytes).map_err(EngineError::InvalidDocument)?;
    match detect(&doc)? {
        ApiDocumentKind::Swagger => Ok(parse_swagger(&doc)),
        ApiDocumentKind::Postman => Ok(parse_postman(&doc)),
    }
}

pub fn parse_swagger(doc: &Value) -> ApiDocument {
    let info = doc.get("info");
    let schemes = match doc.get("schemes").and_then(Value::as_array) {
        Some(items) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        None => vec!["https".to_string()],
    };

    let mut endpoints = Vec::new();
    if let Some(paths) = doc.get("paths").and_then(Value::as_object) {
        for (path, operations) in paths {
            let Some(operations) = operations.as_object() else {
                continue;
            };
            for (method, operation) in operations {
                let method = method.to_ascii_uppercase();
                if !HTTP_METHODS.contains(&method.as_str()) {
                    continue;
                }
                let mut details = Map::new();
                copy_field(operation, "operationId", "operation_id", &mut details);
                copy_field(operation, "tags", "tags", &mut details);
                copy_field(operation, "parameters", "parameters", &mut details);
                copy_field(operation, "requestBody", "request_body", &mut details);
                copy_field(operation, "responses", "responses", &mut details);

                endpoints.push(ApiEndpoint {
                    path: path.clone(),
                    method,
                    summary: text(operation.get("summary")),
                    description: text(operation.get("description")),
                    details,
                });
            }
        }
    }

    ApiDocument {
        kind: ApiDocumentKind::Swagger,
        title: text_or(info.and_then(|i| i.get("title")), "API Specification"),
        version: text_or(info.and_then(|i| i.get("version")), "1.0.0"),
        description: text(info.and_then(|i| i.get("description"))),
        host: text(doc.get("host")),
        base_path: text(doc.get("basePath")),
        schemes,
        endpoints,
    }
}

pub fn parse_postman(doc: &Value) -> ApiDocument {
    let info = doc.get("info");
    let mut endpoints = Vec::new();
    if let Some(items) = doc.get("item").and_then(Value::as_array) {
        collect_requests(items, &mut endpoints);
    }

    ApiDocument {
        kind: ApiDocumentKind::Postman,
        title: text_or(info.and_then(|i| i.get("name")), "Postman Collection"),
        version: String::new(),
        description: text(info.and_then(|i| i.get("description"))),
        host: String::new(),
        base_path: String::new(),
        schemes: Vec::new(),
        endpoints,
    }
}

fn collect_requests(items: &[Value], endpoints: &mut Vec<ApiEndpoint>) {
    for item in items {
        if let Some(request) = item.get("request") {
            let mut details = Map::new();
            copy_field(request, "header", "headers", &mut details);
            copy_field(request, "body", "body", &mut details);
            copy_field(request, "auth", "auth", &mut details);
            copy_field(item, "event", "tests", &mut details);

            endpoints.push(ApiEndpoint {
                path: postman_path(request.get("url")),
                method: text_or(request.get("method"), "GET"),
                summary: text(item.get("name")),
                description: text(request.get("description")),
                details,
            });
        } else if let Some(children) = item.get("item").and_then(Value::as_array) {
            collect_requests(children, endpoints);
        }
    }
}

/// Postman URLs come as a plain string, an object with a `path` array, or an object with `raw`
fn postman_path(url: Option<&Value>) -> String {
    let path = match url {
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Object(obj)) => match obj.get("path").and_then(Value::as_array) {
            Some(parts) => {
                let parts: Vec<String> = parts
                    .iter()
                    .map(|p| match p {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                format!("/{}", parts.join("/"))
            }
            None => text(obj.get("raw")),
        },
        Some(other) => other.to_string(),
        None => String::new(),
    };

    if path.starts_with("http") {
        if let Ok(parsed) = Url::parse(&path) {
            return parsed.path().to_string();
        }
    }
    path
}

fn copy_field(source: &Value, from: &str, to: &str, target: &mut Map<String, Value>) {
    if let Some(value) = source.get(from) {
        target.insert(to.to_string(), value.clone());
    }
}

/// Postman descriptions may be `{content, type}` objects
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(obj)) => obj
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    let s = text(value);
    if s.is_empty() {
        default.to_string()
    } else {
        s
    }
}
