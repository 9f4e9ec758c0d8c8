//! System prompts and user message builders

use serde_json::Value;

use crate::api_docs::{ApiDocument, ApiDocumentKind};
use crate::website::{PageSummary, ProbeResult};

/// Endpoints listed in the API scenario prompt before summarising the rest
const PROMPT_ENDPOINT_LIMIT: usize = 10;
/// HTML characters passed to the rating prompt
const PROMPT_HTML_CHARS: usize = 10_000;

const JSON_ONLY: &str = "CRITICAL: Respond with ONLY valid JSON. Do not include any explanatory text, comments, or formatting outside of the JSON structure.";

pub fn scenario_system_prompt(scenarios_only: bool) -> String {
    let depth = if scenarios_only {
        "Return only the scenario title, description, category, priority and preconditions, with an empty test_cases array."
    } else {
        "Also generate detailed test cases for each scenario."
    };
    format!(
        r#"You are an expert QA testing agent. Your task is to generate comprehensive test scenarios from a given description or image.

{JSON_ONLY} Start your response directly with '{{' and end with '}}'.

Required JSON format:
{{
    "scenarios": [
        {{
            "id": "SC001",
            "title": "Scenario Title",
            "description": "Brief description of the scenario",
            "priority": "high|medium|low",
            "category": "functional|ui|edge_case|error_handling|validation|workflow",
            "preconditions": ["Precondition 1"],
            "test_cases": [
                {{
                    "id": "SC001-TC01",
                    "title": "Test Case Title",
                    "description": "Detailed test case description",
                    "steps": ["Step 1", "Step 2"],
                    "expected_result": "Expected outcome",
                    "priority": "high|medium|low",
                    "test_data": {{"key": "value"}}
                }}
            ]
        }}
    ]
}}

{depth}

Focus on functional testing, UI/UX testing, edge cases, error handling, data validation and user workflows."#
    )
}

pub fn detailed_system_prompt() -> String {
    format!(
        r#"You are an expert QA testing agent. Generate detailed test cases for the provided test scenarios.

{JSON_ONLY} Start your response directly with '{{' and end with '}}'.

Required JSON format:
{{
    "scenarios": [
        {{
            "id": "<keep the id of the input scenario>",
            "title": "Scenario Title",
            "description": "Brief description of the scenario",
            "preconditions": ["Precondition 1"],
            "test_cases": [
                {{
                    "title": "Test Case Title",
                    "description": "Detailed test case description",
                    "steps": ["Step 1", "Step 2", "Step 3"],
                    "expected_result": "Expected outcome",
                    "priority": "high|medium|low",
                    "test_data": {{"key": "value"}}
                }}
            ]
        }}
    ]
}}

Cover functional, UI/UX, edge case, error handling, data validation and workflow testing for every scenario."#
    )
}

pub fn api_detailed_system_prompt() -> String {
    format!(
        r#"You are an expert API testing specialist. Generate detailed test cases for the provided API scenarios.

{JSON_ONLY} Start with '[' and end with ']'.

JSON format of each element:
{{
    "id": "<keep the id of the input scenario>",
    "title": "Scenario Title",
    "description": "Brief description",
    "category": "functional|negative|security",
    "test_cases": [
        {{
            "title": "Test Case Title",
            "description": "Test description",
            "priority": "high|medium|low",
            "category": "functional|negative|security",
            "steps": ["Step 1", "Step 2"],
            "test_data": {{"method": "GET", "endpoint": "/api/endpoint", "expected_status_code": 200}},
            "expected_result": "Expected outcome"
        }}
    ]
}}

Generate 3-5 test cases per scenario."#
    )
}

pub fn api_system_prompt() -> String {
    format!(
        r#"You are an expert API testing specialist. Generate comprehensive test scenarios and test cases for the API endpoints in the provided documentation.

{JSON_ONLY} Start your response directly with '[' and end with ']'.

JSON format of each element:
{{
    "title": "API Endpoint Test Scenario",
    "description": "What this scenario tests",
    "category": "api_testing",
    "priority": "high|medium|low",
    "endpoints": ["/api/endpoint"],
    "test_cases": [
        {{
            "title": "Specific Test Case Title",
            "description": "What this test case checks",
            "priority": "high|medium|low",
            "category": "functional|negative|performance|security|integration",
            "preconditions": ["Precondition 1"],
            "steps": ["Step 1: action", "Step 2: action"],
            "test_data": {{
                "method": "GET|POST|PUT|DELETE",
                "endpoint": "/api/endpoint",
                "headers": {{"Content-Type": "application/json"}},
                "request_body": {{"key": "value"}},
                "expected_status_code": 200
            }},
            "expected_result": "Expected outcome",
            "validation_criteria": ["Criterion 1"]
        }}
    ]
}}

Consider status codes (200, 201, 400, 401, 403, 404, 422, 500), headers, authentication, validation, error handling and performance."#
    )
}

pub fn rating_system_prompt() -> String {
    format!(
        r#"You are an expert web analyst. Analyze the provided website content and rate it on multiple parameters out of 5 stars.

{JSON_ONLY} Start directly with '{{' and end with '}}'.

Required JSON format:
{{
    "overall_rating": 4,
    "parameters": {{
        "performance": {{"rating": 4, "explanation": "Brief explanation"}},
        "seo": {{"rating": 3, "explanation": "Brief explanation"}},
        "usability": {{"rating": 5, "explanation": "Brief explanation"}},
        "accessibility": {{"rating": 4, "explanation": "Brief explanation"}},
        "security": {{"rating": 3, "explanation": "Brief explanation"}}
    }},
    "report": "Detailed analysis report summarizing strengths and weaknesses",
    "recommendations": ["Recommendation 1", "Recommendation 2"]
}}

The overall rating is the average of the parameter ratings."#
    )
}

pub fn website_scenarios_system_prompt() -> String {
    format!(
        r#"You are an expert QA engineer. Based on the website analysis, generate test scenarios and test cases.

{JSON_ONLY} Start directly with '[' and end with ']'.

JSON format of each element:
{{
    "title": "Scenario Title",
    "description": "Brief description of the scenario",
    "category": "website_testing",
    "priority": "high|medium|low",
    "test_cases": [
        {{
            "title": "Test Case Title",
            "description": "Detailed test case description",
            "priority": "high|medium|low",
            "category": "functional|performance|security|usability|accessibility",
            "preconditions": ["Precondition 1"],
            "steps": ["Step 1", "Step 2"],
            "test_data": {{"key": "value"}}
        }}
    ]
}}

Cover functional, performance, security, usability and accessibility testing, plus API endpoint testing when endpoints were found. Focus on the issues identified in the analysis."#
    )
}

pub fn description_message(description: &str) -> String {
    format!("Generate test scenarios for this feature:\n\n{}", description)
}

pub fn detailed_message(scenarios: &[Value]) -> String {
    format!(
        "Please generate detailed test cases for these {} scenarios:\n\n{}",
        scenarios.len(),
        pretty(&Value::Array(scenarios.to_vec()))
    )
}

pub fn api_message(doc: &ApiDocument) -> String {
    let mut message = match doc.kind {
        ApiDocumentKind::Swagger => format!(
            "Generate API test cases for this Swagger/OpenAPI specification:\n\nAPI Title: {}\nVersion: {}\nDescription: {}\nHost: {}\nBase Path: {}\nSchemes: {}\n",
            doc.title,
            doc.version,
            doc.description,
            doc.host,
            doc.base_path,
            doc.schemes.join(", ")
        ),
        ApiDocumentKind::Postman => format!(
            "Generate API test cases for this Postman collection:\n\nCollection Title: {}\nDescription: {}\n",
            doc.title, doc.description
        ),
    };

    message.push_str("\nEndpoints:\n");
    for endpoint in doc.endpoints.iter().take(PROMPT_ENDPOINT_LIMIT) {
        let summary = if endpoint.summary.is_empty() {
            "No summary"
        } else {
            &endpoint.summary
        };
        message.push_str(&format!("- {} {}: {}\n", endpoint.method, endpoint.path, summary));
    }
    if doc.endpoints.len() > PROMPT_ENDPOINT_LIMIT {
        message.push_str(&format!(
            "... and {} more endpoints\n",
            doc.endpoints.len() - PROMPT_ENDPOINT_LIMIT
        ));
    }
    message.push_str("\nGenerate 8-12 test scenarios covering all major testing aspects.");
    message
}

pub fn rating_message(page: &PageSummary, probes: &[ProbeResult]) -> String {
    let html: String = page.html.chars().take(PROMPT_HTML_CHARS).collect();
    format!(
        "Website URL: {}\nTitle: {}\nMeta Description: {}\n\nAPI Performance Data:\n{}\n\nHTML Content Preview:\n{}",
        page.url,
        page.title,
        page.description,
        pretty(&serde_json::to_value(probes).unwrap_or(Value::Null)),
        html
    )
}

pub fn website_scenarios_message(page: &PageSummary, rating: &Value, probes: &[ProbeResult]) -> String {
    format!(
        "Website: {}\nTitle: {}\n\nAnalysis Results:\nOverall Rating: {}/5\n\nParameter Ratings:\n{}\n\nAnalysis Report:\n{}\n\nRecommendations:\n{}\n\nAPI Performance Data:\n{}\n\nGenerate test scenarios and test cases based on this analysis.",
        page.url,
        page.title,
        rating.get("overall_rating").map_or_else(|| "N/A".to_string(), Value::to_string),
        pretty(rating.get("parameters").unwrap_or(&Value::Null)),
        rating
            .get("report")
            .and_then(Value::as_str)
            .unwrap_or("No report available"),
        pretty(rating.get("recommendations").unwrap_or(&Value::Null)),
        pretty(&serde_json::to_value(probes).unwrap_or(Value::Null)),
    )
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_docs::ApiEndpoint;
    use serde_json::Map;

    #[test]
    fn test_scenario_prompt_depth() {
        assert!(scenario_system_prompt(true).contains("empty test_cases array"));
        assert!(scenario_system_prompt(false).contains("detailed test cases"));
        assert!(scenario_system_prompt(true).starts_with("You are an expert QA"));
    }

    #[test]
    fn test_api_message_truncates_endpoint_list() {
        let endpoints = (0..12)
            .map(|i| ApiEndpoint {
                path: format!("/items/{}", i),
                method: "GET".to_string(),
                summary: String::new(),
                description: String::new(),
                details: Map::new(),
            })
            .collect();
        let doc = ApiDocument {
            kind: ApiDocumentKind::Postman,
            title: "Items".to_string(),
            version: String::new(),
            description: String::new(),
            host: String::new(),
            base_path: String::new(),
            schemes: Vec::new(),
            endpoints,
        };
        let message = api_message(&doc);
        assert!(message.contains("- GET /items/9: No summary"));
        assert!(!message.contains("/items/10"));
        assert!(message.contains("... and 2 more endpoints"));
    }
}
