//! Rendering seam between the controller and whatever draws the pages

use testcase_types::AnalysisResult;

use crate::error::NavigationError;
use crate::selection::{AcceptedSet, SelectionSet};
use crate::state::Page;

/// Something that can draw the three pages.
///
/// Implementations show exactly one page per `render_*` call and hide the
/// other two.
pub trait PageView {
    /// Show the input form; `reset_fields` clears every input control
    fn render_input(&mut self, reset_fields: bool) -> Result<(), NavigationError>;

    fn render_scenarios(
        &mut self,
        analysis: &AnalysisResult,
        selections: &SelectionSet,
    ) -> Result<(), NavigationError>;

    fn render_results(
        &mut self,
        results: &AnalysisResult,
        accepted: &AcceptedSet,
    ) -> Result<(), NavigationError>;

    /// Update the checkbox and card state of a single scenario
    fn mark_scenario(&mut self, index: usize, selected: bool) -> Result<(), NavigationError>;

    /// Update the accept button of a single test case
    fn mark_test_case(
        &mut self,
        scenario_index: usize,
        case_index: usize,
        accepted: bool,
    ) -> Result<(), NavigationError>;

    fn show_error(&mut self, message: &str) -> Result<(), NavigationError>;

    /// Disable or re-enable the buttons that start requests
    fn set_busy(&mut self, busy: bool) -> Result<(), NavigationError>;
}

/// What a [`HeadlessView`] currently displays
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Input {
        reset: bool,
    },
    Scenarios {
        titles: Vec<String>,
        selected: Vec<bool>,
    },
    Results {
        titles: Vec<String>,
        accepted: Vec<Vec<bool>>,
    },
}

impl Frame {
    pub fn page(&self) -> Page {
        match self {
            Frame::Input { .. } => Page::Input,
            Frame::Scenarios { .. } => Page::Scenarios,
            Frame::Results { .. } => Page::Results,
        }
    }

    pub fn scenarios(analysis: &AnalysisResult, selections: &SelectionSet) -> Self {
        Frame::Scenarios {
            titles: analysis.scenarios.iter().map(|s| s.title.clone()).collect(),
            selected: analysis
                .scenarios
                .iter()
                .map(|s| selections.contains(s))
                .collect(),
        }
    }

    pub fn results(results: &AnalysisResult, accepted: &AcceptedSet) -> Self {
        Frame::Results {
            titles: results.scenarios.iter().map(|s| s.title.clone()).collect(),
            accepted: results
                .scenarios
                .iter()
                .enumerate()
                .map(|(s, scenario)| {
                    scenario
                        .test_cases
                        .iter()
                        .enumerate()
                        .map(|(t, tc)| accepted.contains(&tc.key(s, t)))
                        .collect()
                })
                .collect(),
        }
    }
}

/// View that keeps the displayed frame in memory
#[derive(Debug, Clone)]
pub struct HeadlessView {
    frame: Frame,
    errors: Vec<String>,
    busy: bool,
}

impl Default for HeadlessView {
    fn default() -> Self {
        Self {
            frame: Frame::Input { reset: false },
            errors: Vec::new(),
            busy: false,
        }
    }
}

impl HeadlessView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

impl PageView for HeadlessView {
    fn render_input(&mut self, reset_fields: bool) -> Result<(), NavigationError> {
        self.frame = Frame::Input {
            reset: reset_fields,
        };
        Ok(())
    }

    fn render_scenarios(
        &mut self,
        analysis: &AnalysisResult,
        selections: &SelectionSet,
    ) -> Result<(), NavigationError> {
        self.frame = Frame::scenarios(analysis, selections);
        Ok(())
    }

    fn render_results(
        &mut self,
        results: &AnalysisResult,
        accepted: &AcceptedSet,
    ) -> Result<(), NavigationError> {
        self.frame = Frame::results(results, accepted);
        Ok(())
    }

    fn mark_scenario(&mut self, index: usize, selected: bool) -> Result<(), NavigationError> {
        match &mut self.frame {
            Frame::Scenarios { selected: flags, .. } => match flags.get_mut(index) {
                Some(flag) => {
                    *flag = selected;
                    Ok(())
                }
                None => Err(NavigationError::ScenarioOutOfRange(index)),
            },
            other => Err(NavigationError::Render(format!(
                "scenario card {} is not on the {} page",
                index,
                other.page()
            ))),
        }
    }

    fn mark_test_case(
        &mut self,
        scenario_index: usize,
        case_index: usize,
        accepted: bool,
    ) -> Result<(), NavigationError> {
        let out_of_range = NavigationError::TestCaseOutOfRange {
            scenario: scenario_index,
            case: case_index,
        };
        match &mut self.frame {
            Frame::Results { accepted: flags, .. } => {
                let flag = flags
                    .get_mut(scenario_index)
                    .and_then(|row| row.get_mut(case_index))
                    .ok_or(out_of_range)?;
                *flag = accepted;
                Ok(())
            }
            other => Err(NavigationError::Render(format!(
                "test case card is not on the {} page",
                other.page()
            ))),
        }
    }

    fn show_error(&mut self, message: &str) -> Result<(), NavigationError> {
        self.errors.push(message.to_string());
        Ok(())
    }

    fn set_busy(&mut self, busy: bool) -> Result<(), NavigationError> {
        self.busy = busy;
        Ok(())
    }
}
