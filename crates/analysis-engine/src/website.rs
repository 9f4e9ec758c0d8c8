//! Website fetching, HTML inspection and endpoint probing

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::EngineError;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Characters of the page that are analysed
pub const PAGE_CHAR_LIMIT: usize = 20_000;
pub const MAX_ENDPOINTS: usize = 10;
pub const MAX_PROBES: usize = 5;

const API_KEYWORDS: &[&str] = &["api", "v1", "v2", "v3", "graphql", "rest"];

lazy_static! {
    static ref TITLE: Regex = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
    static ref META_DESCRIPTION: Regex = Regex::new(
        r#"(?i)<meta[^>]*name=["']description["'][^>]*content=["']([^"']*)["'][^>]*>"#
    )
    .unwrap();
    static ref FETCH_CALL: Regex = Regex::new(r#"(?i)fetch\s*\(\s*["']([^"']+)["']"#).unwrap();
    static ref XHR_OPEN: Regex = Regex::new(
        r#"(?i)open\s*\(\s*["'](?:GET|POST|PUT|DELETE)["']\s*,\s*["']([^"']+)["']"#
    )
    .unwrap();
    static ref SCRIPT_SRC: Regex =
        Regex::new(r#"(?i)<script[^>]*src=["']([^"']+)["'][^>]*>"#).unwrap();
    static ref LINK_HREF: Regex =
        Regex::new(r#"(?i)<link[^>]*href=["']([^"']+)["'][^>]*>"#).unwrap();
}

/// The parts of a fetched page the analysis works with
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub description: String,
    /// First [`PAGE_CHAR_LIMIT`] characters of the body
    pub html: String,
}

impl PageSummary {
    pub fn from_html(url: &str, body: &str) -> Self {
        let html: String = body.chars().take(PAGE_CHAR_LIMIT).collect();
        Self {
            url: url.to_string(),
            title: capture(&TITLE, &html),
            description: capture(&META_DESCRIPTION, &html),
            html,
        }
    }
}

/// Timing of one GET against a discovered endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub endpoint: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn failed(endpoint: &str, error: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            success: false,
            response_time_ms: None,
            status_code: None,
            content_length: None,
            error: Some(error.into()),
        }
    }
}

/// Require a scheme and a host
pub fn validate_url(raw: &str) -> Result<Url, EngineError> {
    let url = Url::parse(raw.trim()).map_err(|_| EngineError::InvalidUrl)?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(EngineError::InvalidUrl),
    }
}

/// Candidate API endpoints referenced by the page on hosts other than its own.
///
/// Sorted and capped at [`MAX_ENDPOINTS`].
pub fn extract_endpoints(html: &str, base: &Url) -> Vec<String> {
    let base_host = base.host_str().unwrap_or_default();
    let mut found = BTreeSet::new();

    let external = |candidate: &Url| {
        candidate
            .host_str()
            .map_or(false, |host| !host.is_empty() && host != base_host)
    };

    for pattern in [&*FETCH_CALL, &*XHR_OPEN] {
        for cap in pattern.captures_iter(html) {
            let target = &cap[1];
            if !(target.starts_with("http://") || target.starts_with("https://")) {
                continue;
            }
            if let Ok(url) = Url::parse(target) {
                if external(&url) {
                    found.insert(target.to_string());
                }
            }
        }
    }

    for cap in SCRIPT_SRC.captures_iter(html) {
        if let Ok(url) = base.join(&cap[1]) {
            let lowered = url.as_str().to_ascii_lowercase();
            if external(&url) && API_KEYWORDS.iter().any(|k| lowered.contains(k)) {
                found.insert(url.to_string());
            }
        }
    }

    for cap in LINK_HREF.captures_iter(html) {
        if let Ok(url) = base.join(&cap[1]) {
            if external(&url) {
                found.insert(url.to_string());
            }
        }
    }

    found.into_iter().take(MAX_ENDPOINTS).collect()
}

fn capture(pattern: &Regex, html: &str) -> String {
    pattern
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Network access needed by the website analyzer
#[async_trait]
pub trait WebFetcher: Send + Sync {
    /// Fetch a page body. Non-success statuses are errors.
    async fn fetch_page(&self, url: &Url) -> Result<String, EngineError>;

    /// GET `endpoint` and time it. Failures are reported inside the result.
    async fn probe(&self, endpoint: &str) -> ProbeResult;
}

/// [`WebFetcher`] over reqwest with a browser user agent
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .map_err(|e| EngineError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<String, EngineError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(PAGE_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| EngineError::Fetch(e.to_string()))?;

        response
            .text()
            .await
            .map_err(|e| EngineError::Fetch(e.to_string()))
    }

    async fn probe(&self, endpoint: &str) -> ProbeResult {
        let started = Instant::now();
        let response = match self.client.get(endpoint).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response,
            Err(e) => return ProbeResult::failed(endpoint, e.to_string()),
        };
        let status = response.status().as_u16();

        match response.bytes().await {
            Ok(body) => {
                let elapsed = started.elapsed().as_secs_f64() * 1000.0;
                ProbeResult {
                    endpoint: endpoint.to_string(),
                    success: status < 400,
                    response_time_ms: Some((elapsed * 100.0).round() / 100.0),
                    status_code: Some(status),
                    content_length: Some(body.len()),
                    error: None,
                }
            }
            Err(e) => ProbeResult::failed(endpoint, e.to_string()),
        }
    }
}

/// Probe up to [`MAX_PROBES`] endpoints one after another
pub async fn probe_endpoints(fetcher: &dyn WebFetcher, endpoints: &[String]) -> Vec<ProbeResult> {
    let mut results = Vec::new();
    for endpoint in endpoints.iter().take(MAX_PROBES) {
        let result = fetcher.probe(endpoint).await;
        if result.success {
            debug!("Probe {} -> {:?} in {:?}ms", endpoint, result.status_code, result.response_time_ms);
        } else {
            warn!("Probe {} failed: {:?}", endpoint, result.error);
        }
        results.push(result);
    }
    results
}
