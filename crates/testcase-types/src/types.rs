use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Priority assigned by the model to a scenario or test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Parse the free-form priority strings models produce ("High", "P1", "high|medium|low")
    pub fn parse_lenient(raw: &str) -> Self {
        let first = raw
            .split(|c: char| c == '/' || c == '|' || c.is_whitespace())
            .find(|part| !part.is_empty())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match first.as_str() {
            "high" | "critical" | "p0" | "p1" => Priority::High,
            "low" | "p3" | "p4" => Priority::Low,
            _ => Priority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of input an analysis was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Text,
    Image,
    Swagger,
    Postman,
    Website,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Text => "text",
            DocumentType::Image => "image",
            DocumentType::Swagger => "swagger",
            DocumentType::Postman => "postman",
            DocumentType::Website => "website",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "description" => Some(DocumentType::Text),
            "image" => Some(DocumentType::Image),
            "swagger" | "openapi" => Some(DocumentType::Swagger),
            "postman" => Some(DocumentType::Postman),
            "website" => Some(DocumentType::Website),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete, steppable procedure belonging to one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected_result: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub test_data: Map<String, Value>,
    /// Fields the model returned that have no dedicated slot (validation criteria etc.)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TestCase {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            steps: Vec::new(),
            expected_result: String::new(),
            priority: Priority::default(),
            category: String::new(),
            preconditions: Vec::new(),
            test_data: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Key used to track acceptance of this test case.
    ///
    /// Falls back to `idx:<scenario>-<case>` when no id exists. The fallback
    /// changes whenever the server reorders its output.
    pub fn key(&self, scenario_index: usize, case_index: usize) -> String {
        match self.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => format!("idx:{}-{}", scenario_index, case_index),
        }
    }
}

/// A named, prioritized testing situation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scenario {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            priority: Priority::default(),
            category: String::new(),
            preconditions: Vec::new(),
            test_cases: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_test_cases(mut self, test_cases: Vec<TestCase>) -> Self {
        self.test_cases = test_cases;
        self
    }

    /// Whether two scenarios denote the same selection target.
    ///
    /// Ids decide when both sides carry one; otherwise title and description must match.
    pub fn same_target(&self, other: &Scenario) -> bool {
        let own = self.id.as_deref().filter(|id| !id.is_empty());
        let theirs = other.id.as_deref().filter(|id| !id.is_empty());

        match (own, theirs) {
            (Some(a), Some(b)) => a == b,
            _ => self.title == other.title && self.description == other.description,
        }
    }
}

/// Metadata about a parsed API document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub endpoints_count: usize,
    pub parsed_at: DateTime<Utc>,
}

/// One rated quality dimension of a website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRating {
    pub rating: f64,
    #[serde(default)]
    pub explanation: String,
}

/// Report produced by the website analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteInfo {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub overall_rating: f64,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterRating>,
    #[serde(default)]
    pub report: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub api_endpoints_found: usize,
    pub analyzed_at: DateTime<Utc>,
}

/// One server response: scenarios plus the metadata of the analysed input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_info: Option<ApiInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_info: Option<WebsiteInfo>,
    pub document_type: DocumentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(document_type: DocumentType, scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            api_info: None,
            website_info: None,
            document_type,
            input_type: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn test_case_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.test_cases.len()).sum()
    }
}
