//! Endpoint tests against a scripted model and a static website

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use analysis_engine::{
    ChatRequest, EngineError, LlmClient, ModelConfig, ProbeResult, TestCaseGenerator, WebFetcher,
};
use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use crate::api::router;
use crate::state::{AppState, UploadPolicy};

const SCENARIOS_ANSWER: &str = r#"Here you go:
{"scenarios": [
  {"title": "Valid login", "description": "Registered user signs in", "priority": "high",
   "category": "functional",
   "test_cases": [{"title": "Correct password", "steps": ["Open login", "Submit"],
                   "expected_result": "Dashboard shown", "priority": "high"}]},
  {"title": "Locked account", "description": "Too many attempts", "priority": "medium",
   "category": "security", "test_cases": []}
]}"#;

/// Replays queued answers, then repeats `fallback` forever
struct ScriptedLlm {
    queued: Mutex<VecDeque<Result<String, EngineError>>>,
    fallback: String,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    fn answering(fallback: &str) -> Arc<Self> {
        Self::queued(Vec::new(), fallback)
    }

    fn queued(answers: Vec<Result<String, EngineError>>, fallback: &str) -> Arc<Self> {
        Arc::new(Self {
            queued: Mutex::new(answers.into()),
            fallback: fallback.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: &ChatRequest) -> Result<String, EngineError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.queued.lock().unwrap().pop_front() {
            Some(answer) => answer,
            None => Ok(self.fallback.clone()),
        }
    }
}

struct StaticSite;

#[async_trait]
impl WebFetcher for StaticSite {
    async fn fetch_page(&self, _url: &Url) -> Result<String, EngineError> {
        Ok(r#"<html><head><title>Shop</title>
            <meta name="description" content="An online shop"></head>
            <body><script>fetch("https://api.shop-backend.com/v1/cart")</script></body></html>"#
            .to_string())
    }

    async fn probe(&self, endpoint: &str) -> ProbeResult {
        ProbeResult::failed(endpoint, "probes disabled in tests")
    }
}

fn server_with(llm: Arc<ScriptedLlm>) -> TestServer {
    let state = AppState {
        generator: TestCaseGenerator::new(llm, Arc::new(StaticSite), ModelConfig::default()),
        uploads: UploadPolicy::default(),
    };
    TestServer::new(router(Arc::new(state))).unwrap()
}

fn server() -> TestServer {
    server_with(ScriptedLlm::answering(SCENARIOS_ANSWER))
}

fn assert_error(body: &Value, status: StatusCode, message: &str) {
    assert_eq!(body["error"], json!(message));
    assert_eq!(body["status"], json!(status.as_u16()));
}

#[tokio::test]
async fn test_health() {
    let response = server().get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "testcase-api");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_analyze_description() {
    let llm = ScriptedLlm::answering(SCENARIOS_ANSWER);
    let server = server_with(llm.clone());

    let form = MultipartForm::new().add_text("description", "  User login with email validation ");
    let response = server.post("/analyze").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["document_type"], "text");
    assert_eq!(body["input_type"], "description");
    assert_eq!(body["scenarios"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["scenarios"][0]["id"], "SC001");
    assert_eq!(body["scenarios"][1]["id"], "SC002");
    assert!(body["generated_at"].is_string());

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4");
}

#[tokio::test]
async fn test_analyze_image_uses_vision_model() {
    let llm = ScriptedLlm::answering(SCENARIOS_ANSWER);
    let server = server_with(llm.clone());

    let image = Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
        .file_name("checkout.png")
        .mime_type("image/png");
    let form = MultipartForm::new()
        .add_text("description", "")
        .add_part("image", image);
    let response = server.post("/analyze").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["document_type"], "image");
    assert_eq!(llm.requests()[0].model, "gpt-4o");
}

#[tokio::test]
async fn test_analyze_requires_input() {
    let form = MultipartForm::new().add_text("description", "   ");
    let response = server().post("/analyze").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(
        &response.json(),
        StatusCode::BAD_REQUEST,
        "Please provide either a description or upload an image",
    );
}

#[tokio::test]
async fn test_analyze_rejects_disallowed_extension() {
    let file = Part::bytes(b"plain text".to_vec())
        .file_name("notes.txt")
        .mime_type("text/plain");
    let form = MultipartForm::new().add_part("image", file);
    let response = server().post("/analyze").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(
        &response.json(),
        StatusCode::BAD_REQUEST,
        "Invalid image file. Allowed formats: PNG, JPG, JPEG, GIF, BMP, WebP",
    );
}

#[tokio::test]
async fn test_analyze_model_garbage_is_bad_gateway() {
    let server = server_with(ScriptedLlm::answering("I cannot help with that."));

    let form = MultipartForm::new().add_text("description", "Password reset");
    let response = server.post("/analyze").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse AI response as JSON"));
    assert_eq!(body["status"], 502);
}

#[tokio::test]
async fn test_model_timeout_is_gateway_timeout() {
    let llm = ScriptedLlm::queued(vec![Err(EngineError::Timeout)], SCENARIOS_ANSWER);
    let server = server_with(llm);

    let form = MultipartForm::new().add_text("description", "Password reset");
    let response = server.post("/analyze").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::GATEWAY_TIMEOUT);
    assert_error(
        &response.json(),
        StatusCode::GATEWAY_TIMEOUT,
        "Model request timed out",
    );
}

#[tokio::test]
async fn test_generate_from_selected_scenarios() {
    let llm = ScriptedLlm::answering(SCENARIOS_ANSWER);
    let server = server_with(llm.clone());

    let response = server
        .post("/generate")
        .json(&json!({
            "scenarios": [
                {"id": "SC001", "title": "Valid login", "description": "Registered user signs in"}
            ],
            "document_type": "image"
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["input_type"], "selected_scenarios");
    assert_eq!(body["document_type"], "image");
    assert_eq!(body["scenarios"][0]["test_cases"][0]["id"], "SC001-TC01");
    assert_eq!(llm.requests().len(), 1);
}

#[tokio::test]
async fn test_generate_without_scenarios_field() {
    let response = server()
        .post("/generate")
        .json(&json!({"selected": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(
        &response.json(),
        StatusCode::BAD_REQUEST,
        "Invalid JSON data. Expected 'scenarios' field",
    );
}

#[tokio::test]
async fn test_generate_with_empty_scenarios() {
    let response = server()
        .post("/generate")
        .json(&json!({"scenarios": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_from_form_returns_test_cases() {
    let form = MultipartForm::new().add_text("description", "Checkout with coupon");
    let response = server().post("/generate").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["input_type"], "description");
    assert_eq!(body["scenarios"][0]["test_cases"][0]["title"], "Correct password");
}

#[tokio::test]
async fn test_analyze_website_from_json() {
    let rating = r#"{"overall_rating": 7.5, "parameters": {"performance": {"rating": 8, "explanation": "fast"}},
                    "report": "Solid shop", "recommendations": ["Add alt text"]}"#;
    let llm = ScriptedLlm::queued(vec![Ok(rating.to_string())], SCENARIOS_ANSWER);
    let server = server_with(llm.clone());

    let response = server
        .post("/analyze_website")
        .json(&json!({"url": "https://shop.example.com"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["document_type"], "website");
    assert_eq!(body["website_info"]["title"], "Shop");
    assert_eq!(body["website_info"]["overall_rating"], 7.5);
    assert_eq!(body["website_info"]["api_endpoints_found"], 1);
    assert_eq!(body["scenarios"].as_array().map(Vec::len), Some(2));
    assert_eq!(llm.requests().len(), 2);
}

#[derive(Serialize)]
struct UrlForm {
    url: String,
}

#[tokio::test]
async fn test_analyze_website_from_urlencoded_form() {
    let llm = ScriptedLlm::queued(vec![Ok(r#"{"overall_rating": 6}"#.to_string())], SCENARIOS_ANSWER);
    let server = server_with(llm);

    let response = server
        .post("/analyze_website")
        .form(&UrlForm {
            url: "https://shop.example.com".to_string(),
        })
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_analyze_website_requires_url() {
    let form = MultipartForm::new().add_text("url", "  ");
    let response = server().post("/analyze_website").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(
        &response.json(),
        StatusCode::BAD_REQUEST,
        "Please provide a website URL",
    );
}

#[tokio::test]
async fn test_analyze_website_rejects_bad_url() {
    let response = server()
        .post("/analyze_website")
        .json(&json!({"url": "not a url"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(&response.json(), StatusCode::BAD_REQUEST, "Invalid URL format");
}

fn swagger_upload(filename: &str) -> MultipartForm {
    let doc = json!({
        "swagger": "2.0",
        "info": {"title": "Pet Store", "version": "1.0"},
        "paths": {
            "/pets": {"get": {"summary": "List pets"}, "post": {"summary": "Add pet"}}
        }
    });
    let part = Part::bytes(serde_json::to_vec(&doc).unwrap())
        .file_name(filename)
        .mime_type("application/json");
    MultipartForm::new().add_part("api_file", part)
}

#[tokio::test]
async fn test_generate_api_tests() {
    let response = server()
        .post("/generate_api_tests")
        .multipart(swagger_upload("petstore.json"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["document_type"], "swagger");
    assert_eq!(body["input_type"], "api_document_swagger");
    assert_eq!(body["api_info"]["title"], "Pet Store");
    assert_eq!(body["api_info"]["endpoints_count"], 2);
    assert_eq!(body["scenarios"][0]["id"], "API_SC001");
}

#[tokio::test]
async fn test_generate_api_tests_requires_json_filename() {
    let response = server()
        .post("/generate_api_tests")
        .multipart(swagger_upload("petstore.yaml"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(&response.json(), StatusCode::BAD_REQUEST, "Please upload a JSON file");
}

#[tokio::test]
async fn test_generate_api_tests_requires_file() {
    let form = MultipartForm::new().add_text("description", "no file here");
    let response = server().post("/generate_api_tests").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(
        &response.json(),
        StatusCode::BAD_REQUEST,
        "Please upload an API document file (Swagger/OpenAPI JSON or Postman collection)",
    );
}

#[tokio::test]
async fn test_generate_api_tests_unknown_document() {
    let llm = ScriptedLlm::answering(SCENARIOS_ANSWER);
    let server = server_with(llm.clone());

    let part = Part::bytes(br#"{"hello": "world"}"#.to_vec())
        .file_name("hello.json")
        .mime_type("application/json");
    let response = server
        .post("/generate_api_tests")
        .multipart(MultipartForm::new().add_part("api_file", part))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Unable to detect API document type"));
    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let state = AppState {
        generator: TestCaseGenerator::new(
            ScriptedLlm::answering(SCENARIOS_ANSWER),
            Arc::new(StaticSite),
            ModelConfig::default(),
        ),
        uploads: UploadPolicy {
            max_content_length: 64,
            ..UploadPolicy::default()
        },
    };
    let body = json!({"scenarios": [{"title": "x".repeat(256)}]}).to_string();
    let request = Request::post("/generate")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = router(Arc::new(state)).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
