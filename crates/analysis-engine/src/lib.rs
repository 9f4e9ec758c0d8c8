//! Test scenario generation backed by a chat completion model
//!
//! Inputs are a feature description, a screenshot, a Swagger/OpenAPI or
//! Postman document, or a website URL. Every path ends in a validated
//! [`testcase_types::AnalysisResult`] whose scenarios and test cases carry
//! stable ids.
//!
//! The model and the network sit behind [`LlmClient`] and [`WebFetcher`] so
//! the orchestration in [`TestCaseGenerator`] can be exercised without either.

pub mod api_docs;
pub mod config;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod generator;
pub mod llm;
pub mod prompts;
pub mod website;

pub use api_docs::{detect, parse_document, ApiDocument, ApiDocumentKind, ApiEndpoint};
pub use config::{LlmSettings, ModelConfig};
pub use error::EngineError;
pub use extract::{recover_json, recover_scenarios};
pub use generator::{AnalysisInput, TestCaseGenerator, BATCH_SIZE, BATCH_THRESHOLD};
pub use llm::{ChatMessage, ChatRequest, ContentPart, LlmClient, MessageContent, OpenAiClient};
pub use website::{HttpFetcher, PageSummary, ProbeResult, WebFetcher};
