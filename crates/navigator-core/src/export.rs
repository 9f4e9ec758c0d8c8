//! Client-side export of generated test cases

use chrono::{DateTime, Utc};
use testcase_types::AnalysisResult;

use crate::error::NavigationError;
use crate::selection::AcceptedSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    All,
    Accepted,
}

/// A JSON document ready to be offered as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

impl ExportFile {
    pub const MIME_TYPE: &'static str = "application/json";
}

/// Serialize `results`, optionally filtered to accepted test cases.
///
/// Returns `None` when the filtered result would be empty. Scenarios keep
/// their position-based keys from `results` while filtering, so keys are
/// computed before anything is removed.
pub fn build_export(
    results: &AnalysisResult,
    accepted: &AcceptedSet,
    scope: ExportScope,
    exported_at: DateTime<Utc>,
) -> Result<Option<ExportFile>, NavigationError> {
    let document = match scope {
        ExportScope::All => results.clone(),
        ExportScope::Accepted => filter_accepted(results, accepted),
    };

    if document.is_empty() {
        return Ok(None);
    }

    let contents = serde_json::to_string_pretty(&document)
        .map_err(|e| NavigationError::Serialization(e.to_string()))?;

    let prefix = match scope {
        ExportScope::All => "test-cases",
        ExportScope::Accepted => "accepted-test-cases",
    };
    let filename = format!("{}-{}.json", prefix, exported_at.format("%Y%m%d-%H%M%S"));

    Ok(Some(ExportFile { filename, contents }))
}

fn filter_accepted(results: &AnalysisResult, accepted: &AcceptedSet) -> AnalysisResult {
    let mut filtered = results.clone();
    filtered.scenarios = results
        .scenarios
        .iter()
        .enumerate()
        .filter_map(|(s, scenario)| {
            let test_cases: Vec<_> = scenario
                .test_cases
                .iter()
                .enumerate()
                .filter(|(t, tc)| accepted.contains(&tc.key(s, *t)))
                .map(|(_, tc)| tc.clone())
                .collect();

            if test_cases.is_empty() {
                return None;
            }
            let mut kept = scenario.clone();
            kept.test_cases = test_cases;
            Some(kept)
        })
        .collect();
    filtered
}
