use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Unable to detect API document type. Please upload a valid Swagger/OpenAPI specification or Postman collection.")]
    UnknownDocument,

    #[error("Invalid JSON file. Please upload a valid JSON file.")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Failed to fetch website: {0}")]
    Fetch(String),

    #[error("Failed to parse AI response")]
    RatingUnreadable,

    #[error("Failed to parse AI response as JSON: {0}")]
    UnparseableResponse(String),

    #[error("Model request timed out")]
    Timeout,

    #[error("Model request failed: {0}")]
    Llm(String),
}

impl EngineError {
    /// Whether the caller supplied something unusable, as opposed to an upstream failure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidInput(_)
                | EngineError::UnknownDocument
                | EngineError::InvalidDocument(_)
                | EngineError::InvalidUrl
                | EngineError::Fetch(_)
                | EngineError::RatingUnreadable
        )
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EngineError::Timeout
        } else {
            EngineError::Llm(e.to_string())
        }
    }
}
