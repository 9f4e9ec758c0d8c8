//! Built-in scenarios used when the model cannot produce any

use serde_json::json;
use testcase_types::{parse_scenarios, Scenario};

pub fn api_scenarios() -> Vec<Scenario> {
    parse_scenarios(&json!([{
        "title": "Basic API Endpoint Testing",
        "description": "Basic test cases for API endpoints",
        "category": "api_testing",
        "priority": "high",
        "test_cases": [
            {
                "title": "Successful API Request",
                "description": "Test successful API request with valid data",
                "priority": "high",
                "category": "functional",
                "preconditions": ["API endpoint is accessible", "Valid authentication credentials"],
                "steps": ["Send valid request to API endpoint", "Verify response received", "Check response status code"],
                "test_data": {
                    "method": "GET",
                    "endpoint": "/api/test",
                    "headers": {"Content-Type": "application/json"},
                    "expected_status_code": 200
                },
                "expected_result": "API returns successful response with expected data",
                "validation_criteria": ["Status code is 200", "Response contains expected data structure"]
            },
            {
                "title": "Invalid Request Handling",
                "description": "Test API behavior with invalid request data",
                "priority": "medium",
                "category": "negative",
                "preconditions": ["API endpoint is accessible"],
                "steps": ["Send request with invalid data", "Verify error response", "Check error message format"],
                "test_data": {
                    "method": "POST",
                    "endpoint": "/api/test",
                    "headers": {"Content-Type": "application/json"},
                    "request_body": {"invalid": "data"},
                    "expected_status_code": 400
                },
                "expected_result": "API returns appropriate error response",
                "validation_criteria": ["Status code indicates error", "Error message is informative"]
            }
        ]
    }]))
    .value
}

pub fn website_scenarios(url: &str) -> Vec<Scenario> {
    parse_scenarios(&json!([{
        "title": "Basic Website Functionality Test",
        "description": "Test basic website functionality and accessibility",
        "category": "website_testing",
        "priority": "high",
        "test_cases": [
            {
                "title": "Website Loads Successfully",
                "description": "Verify that the website loads without errors",
                "priority": "high",
                "category": "functional",
                "preconditions": ["Internet connection is available"],
                "steps": ["Navigate to the website URL", "Wait for page to load completely"],
                "expected_result": "Page renders without errors",
                "test_data": {"url": url}
            },
            {
                "title": "HTTPS Security Check",
                "description": "Verify website uses secure HTTPS connection",
                "priority": "high",
                "category": "security",
                "preconditions": ["Website is accessible"],
                "steps": ["Check URL protocol", "Verify SSL certificate validity"],
                "expected_result": "Connection is served over valid HTTPS",
                "test_data": {"expected_protocol": "https"}
            }
        ]
    }]))
    .value
}
