use thiserror::Error;

use crate::request::RequestKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("History write failed: {0}")]
    History(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("State serialization failed: {0}")]
    Serialization(String),

    #[error("A {0} request is already in flight")]
    RequestInFlight(RequestKind),

    #[error("Scenario index {0} is out of range")]
    ScenarioOutOfRange(usize),

    #[error("Test case {scenario}-{case} is out of range")]
    TestCaseOutOfRange { scenario: usize, case: usize },

    #[error("Select at least one scenario first")]
    NothingSelected,

    #[error("There are no test cases to export")]
    NothingToExport,
}
