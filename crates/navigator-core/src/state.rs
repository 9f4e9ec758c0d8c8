//! Page identifiers and the state stored in each browser history entry

use std::fmt;

use serde::{Deserialize, Serialize};
use testcase_types::{AnalysisResult, Scenario};

use crate::error::NavigationError;

/// The three mutually exclusive pages of the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Input,
    Scenarios,
    Results,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Input => "input",
            Page::Scenarios => "scenarios",
            Page::Results => "results",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot written into `history.state`.
///
/// `data` is the analysis on the scenarios page and the detailed results on
/// the results page. It stays plain JSON so the browser can clone it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    pub page: Page,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalysisResult>,
    #[serde(default)]
    pub selections: Vec<Scenario>,
    #[serde(default)]
    pub accepted: Vec<String>,
}

impl NavigationState {
    pub fn input() -> Self {
        Self {
            page: Page::Input,
            data: None,
            selections: Vec::new(),
            accepted: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, NavigationError> {
        serde_json::to_string(self).map_err(|e| NavigationError::Serialization(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, NavigationError> {
        serde_json::from_str(raw).map_err(|e| NavigationError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testcase_types::DocumentType;

    #[test]
    fn test_page_serializes_lowercase() {
        let json = NavigationState::input().to_json().unwrap();
        assert!(json.contains(r#""page":"input""#));
        assert!(!json.contains("data"));
    }

    #[test]
    fn test_state_survives_json() {
        let scenario = Scenario::new("Login", "valid").with_id("SC001");
        let state = NavigationState {
            page: Page::Scenarios,
            data: Some(AnalysisResult::new(DocumentType::Text, vec![scenario.clone()])),
            selections: vec![scenario],
            accepted: Vec::new(),
        };
        let back = NavigationState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_garbage_state_is_an_error() {
        assert!(matches!(
            NavigationState::from_json(r#"{"page":"elsewhere"}"#),
            Err(NavigationError::Serialization(_))
        ));
    }
}
