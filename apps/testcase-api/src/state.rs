//! Shared application state

use std::sync::Arc;

use analysis_engine::{EngineError, HttpFetcher, OpenAiClient, TestCaseGenerator};

use crate::config::AppConfig;

/// Limits applied to uploaded files
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub allowed_extensions: Vec<String>,
    pub max_content_length: usize,
}

impl UploadPolicy {
    pub fn allows_image(&self, filename: &str) -> bool {
        extension(filename).map_or(false, |ext| {
            self.allowed_extensions
                .iter()
                .any(|allowed| allowed.trim().eq_ignore_ascii_case(&ext))
        })
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: ["png", "jpg", "jpeg", "gif", "bmp", "webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_content_length: 16 * 1024 * 1024,
        }
    }
}

/// Lowercased extension of `filename`, if it has one
pub fn extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// MIME type for an image extension, used when the upload carries none
pub fn image_mime_type(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

pub struct AppState {
    pub generator: TestCaseGenerator,
    pub uploads: UploadPolicy,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self, EngineError> {
        let llm = OpenAiClient::new(config.llm_settings())?;
        let fetcher = HttpFetcher::new()?;
        Ok(Self {
            generator: TestCaseGenerator::new(
                Arc::new(llm),
                Arc::new(fetcher),
                config.model_config(),
            ),
            uploads: UploadPolicy {
                allowed_extensions: config.allowed_extensions.clone(),
                max_content_length: config.max_content_length,
            },
        })
    }
}
