//! Request guarding and classification of server responses
//!
//! Everything here is target independent: the browser glue performs the
//! actual `fetch` and hands the status code and body text to
//! [`classify_response`].

use std::fmt;

use serde_json::Value;
use testcase_types::{parse_analysis_result, AnalysisResult, SchemaError, Validated};

/// Client side timeout applied to every analysis or generation call
pub const REQUEST_TIMEOUT_MS: u32 = 300_000;

const MESSAGE_PREVIEW_CHARS: usize = 200;

/// Which button started the request currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Analyze,
    Generate,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Analyze => f.write_str("analysis"),
            RequestKind::Generate => f.write_str("generation"),
        }
    }
}

/// Refuses a second request while one is in flight
#[derive(Debug, Default, Clone)]
pub struct RequestGuard {
    in_flight: Option<RequestKind>,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a request as started. Returns the kind already running on conflict.
    pub fn begin(&mut self, kind: RequestKind) -> Result<(), RequestKind> {
        match self.in_flight {
            Some(running) => Err(running),
            None => {
                self.in_flight = Some(kind);
                Ok(())
            }
        }
    }

    pub fn finish(&mut self) {
        self.in_flight = None;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RequestKind> {
        self.in_flight
    }
}

/// Why an analysis or generation call produced nothing usable.
///
/// Every variant is recoverable; the caller shows [`AnalysisFailure::user_message`]
/// and leaves the session untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisFailure {
    Timeout,
    Network(String),
    Server { status: u16, message: String },
    Malformed(String),
    NoResults,
}

impl AnalysisFailure {
    pub fn user_message(&self) -> String {
        match self {
            AnalysisFailure::Timeout => format!(
                "Analysis failed: the request timed out after {} seconds. Please try again.",
                REQUEST_TIMEOUT_MS / 1000
            ),
            AnalysisFailure::Network(detail) => {
                format!("Analysis failed: could not reach the server ({})", detail)
            }
            AnalysisFailure::Server { message, .. } => format!("Analysis failed: {}", message),
            AnalysisFailure::Malformed(_) => {
                "Analysis failed: the server returned an unexpected response".to_string()
            }
            AnalysisFailure::NoResults => {
                "No test scenarios were generated. Try adding more detail to your input."
                    .to_string()
            }
        }
    }
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisFailure::Timeout => f.write_str("timeout"),
            AnalysisFailure::Network(detail) => write!(f, "network error: {}", detail),
            AnalysisFailure::Server { status, message } => {
                write!(f, "server error {}: {}", status, message)
            }
            AnalysisFailure::Malformed(detail) => write!(f, "malformed response: {}", detail),
            AnalysisFailure::NoResults => f.write_str("no scenarios returned"),
        }
    }
}

/// Turn a raw HTTP response into a validated result or a failure.
///
/// Non-2xx statuses use the `error` field of the body when present. A 2xx body
/// without scenarios is [`AnalysisFailure::NoResults`].
pub fn classify_response(
    status: u16,
    body: &str,
) -> Result<Validated<AnalysisResult>, AnalysisFailure> {
    let parsed: Result<Value, _> = serde_json::from_str(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| preview(body));
        return Err(AnalysisFailure::Server { status, message });
    }

    let value = parsed.map_err(|e| AnalysisFailure::Malformed(e.to_string()))?;

    let validated = match parse_analysis_result(&value) {
        Ok(validated) => validated,
        Err(SchemaError::Reported(message)) => {
            return Err(AnalysisFailure::Server { status, message })
        }
        Err(e) => return Err(AnalysisFailure::Malformed(e.to_string())),
    };

    if validated.value.is_empty() {
        return Err(AnalysisFailure::NoResults);
    }

    Ok(validated)
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response".to_string();
    }
    trimmed.chars().take(MESSAGE_PREVIEW_CHARS).collect()
}
