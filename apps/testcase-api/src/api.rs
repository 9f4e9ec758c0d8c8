//! HTTP handlers for the test case API
//!
//! - `GET /health`
//! - `POST /analyze`: scenarios only, from a description or image
//! - `POST /generate`: detailed test cases, from selected scenarios (JSON) or a form
//! - `POST /analyze_website`: website rating plus scenarios
//! - `POST /generate_api_tests`: scenarios from a Swagger/OpenAPI or Postman upload

use std::sync::Arc;

use analysis_engine::AnalysisInput;
use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use testcase_types::{AnalysisResult, DocumentType};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ApiError;
use crate::state::{image_mime_type, AppState};

const MISSING_INPUT: &str = "Please provide either a description or upload an image";
const INVALID_IMAGE: &str = "Invalid image file. Allowed formats: PNG, JPG, JPEG, GIF, BMP, WebP";

/// All API routes with body limit and request tracing
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.uploads.max_content_length;

    Router::new()
        .route("/health", get(handle_health))
        .route("/analyze", post(handle_analyze))
        .route("/generate", post(handle_generate))
        .route("/analyze_website", post(handle_analyze_website))
        .route("/generate_api_tests", post(handle_generate_api_tests))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "testcase-api",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Handler: POST /analyze
pub async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let input = read_analysis_form(&state, multipart).await?;
    let result = state.generator.analyze(&input, true).await?;
    info!(
        "Analyzed {} input into {} scenarios",
        input.input_type(),
        result.scenarios.len()
    );
    Ok(Json(result))
}

/// Body of a JSON `/generate` call
#[derive(Deserialize)]
pub struct GenerateRequest {
    pub scenarios: Option<Vec<Value>>,
    pub document_type: Option<String>,
}

/// Handler: POST /generate
///
/// JSON bodies carry the scenarios the user selected; anything else is read
/// as the same form `/analyze` accepts.
pub async fn handle_generate(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<AnalysisResult>, ApiError> {
    if is_json(&request) {
        let Json(body) = Json::<GenerateRequest>::from_request(request, &()).await?;
        let scenarios = body.scenarios.ok_or_else(|| {
            ApiError::BadRequest("Invalid JSON data. Expected 'scenarios' field".to_string())
        })?;
        let document_type = body.document_type.as_deref().and_then(DocumentType::parse);

        let result = state
            .generator
            .generate_for_scenarios(&scenarios, document_type)
            .await?;
        info!(
            "Generated {} test cases for {} selected scenarios",
            result.test_case_count(),
            scenarios.len()
        );
        return Ok(Json(result));
    }

    let multipart = Multipart::from_request(request, &()).await?;
    let input = read_analysis_form(&state, multipart).await?;
    let result = state.generator.analyze(&input, false).await?;
    info!(
        "Generated {} test cases from {} input",
        result.test_case_count(),
        input.input_type()
    );
    Ok(Json(result))
}

#[derive(Deserialize)]
pub struct WebsiteRequest {
    #[serde(default)]
    pub url: String,
}

/// Handler: POST /analyze_website
pub async fn handle_analyze_website(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<AnalysisResult>, ApiError> {
    let url = if is_json(&request) {
        let Json(body) = Json::<WebsiteRequest>::from_request(request, &()).await?;
        body.url
    } else if is_multipart(&request) {
        let mut multipart = Multipart::from_request(request, &()).await?;
        let mut url = String::new();
        while let Some(field) = multipart.next_field().await? {
            if field.name() == Some("url") {
                url = field.text().await?;
            }
        }
        url
    } else {
        let Form(body) = Form::<WebsiteRequest>::from_request(request, &()).await?;
        body.url
    };

    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("Please provide a website URL".to_string()));
    }

    let result = state.generator.analyze_website(url).await?;
    info!("Website {} produced {} scenarios", url, result.scenarios.len());
    Ok(Json(result))
}

/// Handler: POST /generate_api_tests
pub async fn handle_generate_api_tests(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResult>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("api_file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| {
        ApiError::BadRequest(
            "Please upload an API document file (Swagger/OpenAPI JSON or Postman collection)"
                .to_string(),
        )
    })?;
    if filename.is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }
    if !filename.to_ascii_lowercase().ends_with(".json") {
        return Err(ApiError::BadRequest("Please upload a JSON file".to_string()));
    }

    let result = state.generator.analyze_api_document(&bytes).await?;
    info!(
        "API document {} produced {} scenarios",
        filename,
        result.scenarios.len()
    );
    Ok(Json(result))
}

/// Read the `description` / `image` form shared by `/analyze` and `/generate`.
///
/// A non-empty description wins over an image.
async fn read_analysis_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<AnalysisInput, ApiError> {
    let mut description = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("description") => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    description = Some(text.trim().to_string());
                }
            }
            Some("image") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if !filename.is_empty() {
                    image = Some((filename, content_type, bytes));
                }
            }
            _ => {}
        }
    }

    if let Some(description) = description {
        return Ok(AnalysisInput::Description(description));
    }

    let (filename, content_type, bytes) =
        image.ok_or_else(|| ApiError::BadRequest(MISSING_INPUT.to_string()))?;
    if !state.uploads.allows_image(&filename) || bytes.is_empty() {
        return Err(ApiError::BadRequest(INVALID_IMAGE.to_string()));
    }

    let mime_type = content_type
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or_else(|| image_mime_type(&filename).to_string());
    Ok(AnalysisInput::Image {
        bytes: bytes.to_vec(),
        mime_type,
    })
}

fn content_type(request: &Request) -> &str {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn is_json(request: &Request) -> bool {
    content_type(request).starts_with("application/json")
}

fn is_multipart(request: &Request) -> bool {
    content_type(request).starts_with("multipart/form-data")
}
