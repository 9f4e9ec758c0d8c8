//! Server configuration from CLI flags and environment variables

use std::path::PathBuf;
use std::time::Duration;

use analysis_engine::config::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use analysis_engine::{LlmSettings, ModelConfig};
use axum::http::HeaderValue;
use clap::Parser;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Ports always allowed in development besides the configured frontend port
const DEV_EXTRA_PORTS: &[u16] = &[3000, 8080];
const DEV_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0"];

/// Command-line arguments and environment for the test case API server
#[derive(Parser, Debug, Clone)]
#[command(name = "testcase-api")]
#[command(about = "Generate test scenarios and test cases from descriptions, images, API documents and websites")]
pub struct AppConfig {
    /// Deployment environment: development or production
    #[arg(long = "env", env = "ENV", default_value = "development")]
    pub environment: String,

    /// Host address to bind to
    #[arg(long, env = "BACKEND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "BACKEND_PORT", default_value = "5050")]
    pub port: u16,

    /// Port the front end is served from in development
    #[arg(long, env = "FRONTEND_PORT", default_value = "8080")]
    pub frontend_port: u16,

    /// Public URL of the front end (required in production)
    #[arg(long, env = "FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// Additional CORS origins, comma separated
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    #[arg(long, env = "OPENAI_API_KEY", default_value = "", hide_env_values = true)]
    pub openai_api_key: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, env = "OPENAI_MODEL_TEXT", default_value = "gpt-4")]
    pub model_text: String,

    #[arg(long, env = "OPENAI_MODEL_VISION", default_value = "gpt-4o")]
    pub model_vision: String,

    #[arg(long, env = "OPENAI_MODEL_WEBSITE", default_value = "gpt-4")]
    pub model_website: String,

    #[arg(long, env = "OPENAI_MODEL_API", default_value = "gpt-4")]
    pub model_api: String,

    /// Model request timeout in seconds
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub llm_timeout_secs: u64,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_CONTENT_LENGTH", default_value_t = 16 * 1024 * 1024)]
    pub max_content_length: usize,

    /// Accepted image extensions, comma separated
    #[arg(
        long,
        env = "ALLOWED_EXTENSIONS",
        value_delimiter = ',',
        default_value = "png,jpg,jpeg,gif,bmp,webp"
    )]
    pub allowed_extensions: Vec<String>,

    /// Directory with the built front end, served at `/`
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "RATE_LIMIT", default_value = "10")]
    pub rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Problems that make the configuration unusable
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.openai_api_key.trim().is_empty() {
            problems.push("OPENAI_API_KEY is required".to_string());
        }
        if self.is_production() && self.frontend_url.as_deref().map_or(true, str::is_empty) {
            problems.push("FRONTEND_URL is required in production".to_string());
        }
        if self.rate_limit == 0 {
            problems.push("RATE_LIMIT must be at least 1".to_string());
        }
        problems
    }

    /// Origins allowed to call the API. Empty means any origin.
    pub fn cors_origins(&self) -> Vec<String> {
        let mut origins = Vec::new();
        let mut add = |origin: String| {
            let origin = origin.trim().trim_end_matches('/').to_string();
            if !origin.is_empty() && !origins.contains(&origin) {
                origins.push(origin);
            }
        };

        if self.is_production() {
            if let Some(url) = &self.frontend_url {
                add(url.clone());
            }
        } else {
            let mut ports = vec![self.frontend_port];
            ports.extend_from_slice(DEV_EXTRA_PORTS);
            for host in DEV_HOSTS {
                for port in &ports {
                    add(format!("http://{}:{}", host, port));
                }
            }
        }
        for origin in &self.allowed_origins {
            add(origin.clone());
        }
        origins
    }

    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .cors_origins()
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();

        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if origins.is_empty() {
            layer.allow_origin(Any)
        } else {
            layer.allow_origin(AllowOrigin::list(origins))
        }
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            text: self.model_text.clone(),
            vision: self.model_vision.clone(),
            website: self.model_website.clone(),
            api: self.model_api.clone(),
        }
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings::new(self.openai_api_key.clone())
            .with_base_url(self.openai_base_url.clone())
            .with_timeout(Duration::from_secs(self.llm_timeout_secs))
    }
}
