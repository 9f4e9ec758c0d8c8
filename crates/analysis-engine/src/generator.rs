//! Orchestration of model calls for every kind of input

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde_json::Value;
use testcase_types::{
    assign_stable_ids, parse_scenarios, AnalysisResult, ApiInfo, DocumentType, ParameterRating,
    Scenario, WebsiteInfo,
};
use tracing::{debug, info, warn};

use crate::api_docs::{parse_document, ApiDocumentKind};
use crate::config::ModelConfig;
use crate::error::EngineError;
use crate::extract::{recover_json, recover_scenarios};
use crate::fallback;
use crate::llm::{ChatMessage, ChatRequest, ContentPart, LlmClient};
use crate::prompts;
use crate::website::{extract_endpoints, probe_endpoints, validate_url, PageSummary, WebFetcher};

/// Selections above this size are sent to the model in batches
pub const BATCH_THRESHOLD: usize = 5;
pub const BATCH_SIZE: usize = 3;

const SCENARIO_PREFIX: &str = "SC";
const API_SCENARIO_PREFIX: &str = "API_SC";

/// A description or an uploaded image
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisInput {
    Description(String),
    Image { bytes: Vec<u8>, mime_type: String },
}

impl AnalysisInput {
    pub fn input_type(&self) -> &'static str {
        match self {
            AnalysisInput::Description(_) => "description",
            AnalysisInput::Image { .. } => "image",
        }
    }

    pub fn document_type(&self) -> DocumentType {
        match self {
            AnalysisInput::Description(_) => DocumentType::Text,
            AnalysisInput::Image { .. } => DocumentType::Image,
        }
    }
}

pub struct TestCaseGenerator {
    llm: Arc<dyn LlmClient>,
    fetcher: Arc<dyn WebFetcher>,
    models: ModelConfig,
}

impl TestCaseGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, fetcher: Arc<dyn WebFetcher>, models: ModelConfig) -> Self {
        Self {
            llm,
            fetcher,
            models,
        }
    }

    pub fn models(&self) -> &ModelConfig {
        &self.models
    }

    /// Scenarios (and with `scenarios_only == false` also test cases) for a description or image
    pub async fn analyze(
        &self,
        input: &AnalysisInput,
        scenarios_only: bool,
    ) -> Result<AnalysisResult, EngineError> {
        let (model, message) = match input {
            AnalysisInput::Description(description) => {
                if description.trim().is_empty() {
                    return Err(EngineError::InvalidInput(
                        "Please provide either a description or upload an image".to_string(),
                    ));
                }
                (
                    &self.models.text,
                    ChatMessage::user(prompts::description_message(description.trim())),
                )
            }
            AnalysisInput::Image { bytes, mime_type } => (
                &self.models.vision,
                ChatMessage::user_parts(vec![
                    ContentPart::text("Generate test scenarios for the feature shown in this image."),
                    ContentPart::image(mime_type, &STANDARD.encode(bytes)),
                ]),
            ),
        };

        info!(
            "Analyzing {} input (scenarios_only={}) with {}",
            input.input_type(),
            scenarios_only,
            model
        );
        let request = ChatRequest::new(
            model.as_str(),
            prompts::scenario_system_prompt(scenarios_only),
            message,
        );
        let content = self.llm.complete(&request).await?;
        let scenarios = validated(recover_scenarios(&content)?, SCENARIO_PREFIX);

        Ok(AnalysisResult::new(input.document_type(), scenarios).with_input_type(input.input_type()))
    }

    /// Detailed test cases for scenarios the user selected.
    ///
    /// More than [`BATCH_THRESHOLD`] scenarios are processed [`BATCH_SIZE`] at a
    /// time; a failed batch is skipped unless every batch fails.
    pub async fn generate_for_scenarios(
        &self,
        scenarios: &[Value],
        document_type: Option<DocumentType>,
    ) -> Result<AnalysisResult, EngineError> {
        if scenarios.is_empty() {
            return Err(EngineError::InvalidInput(
                "Invalid JSON data. Expected 'scenarios' field".to_string(),
            ));
        }

        let api_style = scenarios.iter().any(is_api_scenario);
        let batches: Vec<&[Value]> = if scenarios.len() > BATCH_THRESHOLD {
            scenarios.chunks(BATCH_SIZE).collect()
        } else {
            vec![scenarios]
        };
        info!(
            "Generating test cases for {} scenarios in {} batch(es)",
            scenarios.len(),
            batches.len()
        );

        let mut detailed = Vec::new();
        let mut last_error = None;
        for (index, batch) in batches.iter().enumerate() {
            match self.generate_batch(batch, api_style).await {
                Ok(items) => detailed.extend(items),
                Err(e) => {
                    warn!("Batch {} of {} failed: {}", index + 1, batches.len(), e);
                    last_error = Some(e);
                }
            }
        }

        if detailed.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let prefix = if api_style {
            API_SCENARIO_PREFIX
        } else {
            SCENARIO_PREFIX
        };
        let scenarios = validated(Value::Array(detailed), prefix);
        Ok(
            AnalysisResult::new(document_type.unwrap_or(DocumentType::Text), scenarios)
                .with_input_type("selected_scenarios"),
        )
    }

    async fn generate_batch(&self, batch: &[Value], api_style: bool) -> Result<Vec<Value>, EngineError> {
        let (model, system) = if api_style {
            (&self.models.api, prompts::api_detailed_system_prompt())
        } else {
            (&self.models.text, prompts::detailed_system_prompt())
        };
        let request = ChatRequest::new(
            model.as_str(),
            system,
            ChatMessage::user(prompts::detailed_message(batch)),
        );
        let content = self.llm.complete(&request).await?;
        match recover_scenarios(&content)? {
            Value::Array(items) => Ok(items),
            _ => Ok(Vec::new()),
        }
    }

    /// Scenarios with test cases for an uploaded Swagger/OpenAPI or Postman document
    pub async fn analyze_api_document(&self, bytes: &[u8]) -> Result<AnalysisResult, EngineError> {
        let doc = parse_document(bytes)?;
        info!(
            "Parsed {} document '{}' with {} endpoints",
            doc.kind.as_str(),
            doc.title,
            doc.endpoints.len()
        );

        let request = ChatRequest::new(
            self.models.api.as_str(),
            prompts::api_system_prompt(),
            ChatMessage::user(prompts::api_message(&doc)),
        );
        let scenarios = match self.llm.complete(&request).await.and_then(|c| recover_scenarios(&c)) {
            Ok(raw) => validated(raw, API_SCENARIO_PREFIX),
            Err(e) => {
                warn!("API scenario generation failed, using fallback: {}", e);
                Vec::new()
            }
        };
        let scenarios = or_fallback(scenarios, fallback::api_scenarios(), API_SCENARIO_PREFIX);

        let document_type = match doc.kind {
            ApiDocumentKind::Swagger => DocumentType::Swagger,
            ApiDocumentKind::Postman => DocumentType::Postman,
        };
        let mut result = AnalysisResult::new(document_type, scenarios)
            .with_input_type(format!("api_document_{}", doc.kind.as_str()));
        result.api_info = Some(ApiInfo {
            title: doc.title,
            description: doc.description,
            endpoints_count: doc.endpoints.len(),
            parsed_at: Utc::now(),
        });
        Ok(result)
    }

    /// Rate a website, then turn the rating into scenarios
    pub async fn analyze_website(&self, raw_url: &str) -> Result<AnalysisResult, EngineError> {
        let url = validate_url(raw_url)?;
        let body = self.fetcher.fetch_page(&url).await?;
        let page = PageSummary::from_html(raw_url.trim(), &body);

        let endpoints = extract_endpoints(&page.html, &url);
        info!(
            "Fetched {} ('{}'), {} candidate endpoints",
            page.url,
            page.title,
            endpoints.len()
        );
        let probes = probe_endpoints(self.fetcher.as_ref(), &endpoints).await;

        let request = ChatRequest::new(
            self.models.website.as_str(),
            prompts::rating_system_prompt(),
            ChatMessage::user(prompts::rating_message(&page, &probes)),
        )
        .with_max_tokens(2000);
        let content = self.llm.complete(&request).await?;
        let rating = match recover_json(&content) {
            Ok(value @ Value::Object(_)) => value,
            _ => return Err(EngineError::RatingUnreadable),
        };

        let request = ChatRequest::new(
            self.models.website.as_str(),
            prompts::website_scenarios_system_prompt(),
            ChatMessage::user(prompts::website_scenarios_message(&page, &rating, &probes)),
        )
        .with_max_tokens(3000);
        let scenarios = match self.llm.complete(&request).await.and_then(|c| recover_scenarios(&c)) {
            Ok(raw) => validated(raw, SCENARIO_PREFIX),
            Err(e) => {
                warn!("Website scenario generation failed, using fallback: {}", e);
                Vec::new()
            }
        };
        let scenarios = or_fallback(scenarios, fallback::website_scenarios(&page.url), SCENARIO_PREFIX);

        let mut result =
            AnalysisResult::new(DocumentType::Website, scenarios).with_input_type("website_url");
        result.website_info = Some(website_info(&page, &rating, endpoints.len()));
        Ok(result)
    }
}

fn is_api_scenario(scenario: &Value) -> bool {
    scenario.get("endpoints").is_some()
        || scenario
            .get("id")
            .and_then(Value::as_str)
            .map_or(false, |id| id.starts_with(API_SCENARIO_PREFIX))
}

/// Validate raw scenarios and give everything a stable id
fn validated(raw: Value, prefix: &str) -> Vec<Scenario> {
    let mut checked = parse_scenarios(&raw);
    if !checked.is_clean() {
        warn!("Dropped or repaired {} malformed items in model output", checked.issues.len());
        for issue in &checked.issues {
            debug!("{}: {}", issue.path, issue.message);
        }
    }
    assign_stable_ids(&mut checked.value, prefix);
    checked.value
}

fn or_fallback(scenarios: Vec<Scenario>, fallback: Vec<Scenario>, prefix: &str) -> Vec<Scenario> {
    if !scenarios.is_empty() {
        return scenarios;
    }
    let mut fallback = fallback;
    assign_stable_ids(&mut fallback, prefix);
    fallback
}

fn website_info(page: &PageSummary, rating: &Value, endpoints_found: usize) -> WebsiteInfo {
    let parameters: BTreeMap<String, ParameterRating> = rating
        .get("parameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .iter()
                .map(|(name, value)| {
                    let rating = match value {
                        Value::Object(obj) => ParameterRating {
                            rating: obj.get("rating").and_then(Value::as_f64).unwrap_or(0.0),
                            explanation: obj
                                .get("explanation")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                        },
                        other => ParameterRating {
                            rating: other.as_f64().unwrap_or(0.0),
                            explanation: String::new(),
                        },
                    };
                    (name.clone(), rating)
                })
                .collect()
        })
        .unwrap_or_default();

    WebsiteInfo {
        title: page.title.clone(),
        url: page.url.clone(),
        description: page.description.clone(),
        overall_rating: rating
            .get("overall_rating")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        parameters,
        report: rating
            .get("report")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        recommendations: rating
            .get("recommendations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        api_endpoints_found: endpoints_found,
        analyzed_at: Utc::now(),
    }
}
