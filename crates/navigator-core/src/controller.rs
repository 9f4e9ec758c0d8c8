//! Page controller: decides which page is visible and keeps browser history in sync

use chrono::{DateTime, Utc};
use testcase_types::{AnalysisResult, Scenario};

use crate::error::NavigationError;
use crate::export::{build_export, ExportFile, ExportScope};
use crate::history::{HistoryBackend, HistoryWrite};
use crate::request::{AnalysisFailure, RequestGuard, RequestKind};
use crate::session::Session;
use crate::state::{NavigationState, Page};
use crate::view::PageView;

/// Owns the [`Session`] and drives a [`PageView`] and a [`HistoryBackend`].
///
/// Exactly one page is visible at a time. History writes replace the current
/// entry when it already belongs to the page being recorded and push otherwise.
pub struct PageController<H, V> {
    session: Session,
    history: H,
    view: V,
    guard: RequestGuard,
    visible: Page,
    /// Page of the history entry the browser currently sits on
    entry_page: Option<Page>,
}

impl<H: HistoryBackend, V: PageView> PageController<H, V> {
    pub fn new(history: H, view: V) -> Self {
        Self {
            session: Session::new(),
            history,
            view,
            guard: RequestGuard::new(),
            visible: Page::Input,
            entry_page: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn visible_page(&self) -> Page {
        self.visible
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Show the input form. `force_reset` also clears the session.
    pub fn show_input(&mut self, force_reset: bool) -> Result<(), NavigationError> {
        if force_reset {
            self.session.reset();
        }
        self.view.render_input(force_reset)?;
        self.visible = Page::Input;
        Ok(())
    }

    /// Start over from a clean input form, recorded as its own history entry
    pub fn new_analysis(&mut self) -> Result<(), NavigationError> {
        self.show_input(true)?;
        self.record()
    }

    /// Render the current analysis as selectable cards.
    ///
    /// Without an analysis there is nothing to select and the input page is shown.
    pub fn show_scenarios(&mut self, save_history: bool) -> Result<(), NavigationError> {
        let Some(analysis) = self.session.analysis() else {
            return self.show_input(false);
        };
        self.view.render_scenarios(analysis, self.session.selections())?;
        self.visible = Page::Scenarios;

        if save_history {
            self.record()?;
        }
        Ok(())
    }

    /// Render `data` as scenario and test case cards
    pub fn show_results(
        &mut self,
        data: AnalysisResult,
        save_history: bool,
    ) -> Result<(), NavigationError> {
        self.session.display_results(data);
        self.render_current_results()?;

        if save_history {
            self.record()?;
        }
        Ok(())
    }

    /// A new analysis arrived. Replaces the previous one and clears both sets.
    pub fn analysis_completed(&mut self, analysis: AnalysisResult) -> Result<(), NavigationError> {
        if analysis.is_empty() {
            return self.report_failure(&AnalysisFailure::NoResults);
        }
        self.session.replace_analysis(analysis);
        self.show_scenarios(true)
    }

    /// Detailed results arrived. Replaces earlier results and clears acceptances.
    pub fn results_generated(&mut self, results: AnalysisResult) -> Result<(), NavigationError> {
        if results.is_empty() {
            return self.report_failure(&AnalysisFailure::NoResults);
        }
        self.session.replace_results(results);
        self.render_current_results()?;
        self.record()
    }

    /// Toggle the scenario at `index` of the current analysis.
    ///
    /// Returns whether it is selected afterwards.
    pub fn toggle_scenario(&mut self, index: usize) -> Result<bool, NavigationError> {
        let scenario = self
            .session
            .analysis()
            .and_then(|a| a.scenarios.get(index))
            .cloned()
            .ok_or(NavigationError::ScenarioOutOfRange(index))?;

        let selected = self.session.selections_mut().toggle(&scenario);
        if self.visible == Page::Scenarios {
            self.view.mark_scenario(index, selected)?;
            let state = self.snapshot();
            self.history.replace(&state)?;
        }
        Ok(selected)
    }

    /// Select or deselect every scenario of the current analysis
    pub fn select_all(&mut self, selected: bool) -> Result<(), NavigationError> {
        let scenarios: Vec<Scenario> = self
            .session
            .analysis()
            .map(|a| a.scenarios.clone())
            .unwrap_or_default();

        let selections = self.session.selections_mut();
        if selected {
            scenarios.iter().for_each(|s| selections.insert(s));
        } else {
            selections.clear();
        }

        if self.visible == Page::Scenarios {
            for index in 0..scenarios.len() {
                self.view.mark_scenario(index, selected)?;
            }
            let state = self.snapshot();
            self.history.replace(&state)?;
        }
        Ok(())
    }

    /// Toggle acceptance of one test case on the results page.
    ///
    /// Returns whether it is accepted afterwards.
    pub fn toggle_test_case(
        &mut self,
        scenario_index: usize,
        case_index: usize,
    ) -> Result<bool, NavigationError> {
        let key = self
            .session
            .results()
            .and_then(|r| r.scenarios.get(scenario_index))
            .and_then(|s| s.test_cases.get(case_index))
            .map(|tc| tc.key(scenario_index, case_index))
            .ok_or(NavigationError::TestCaseOutOfRange {
                scenario: scenario_index,
                case: case_index,
            })?;

        let accepted = self.session.accepted_mut().toggle(&key);
        if self.visible == Page::Results {
            self.view.mark_test_case(scenario_index, case_index, accepted)?;
            let state = self.snapshot();
            self.history.replace(&state)?;
        }
        Ok(accepted)
    }

    /// Scenarios to send for detailed generation
    pub fn selected_scenarios(&self) -> Result<Vec<Scenario>, NavigationError> {
        let selected = self.session.selected_scenarios();
        if selected.is_empty() {
            return Err(NavigationError::NothingSelected);
        }
        Ok(selected)
    }

    /// Claim the request slot and disable the triggers
    pub fn begin_request(&mut self, kind: RequestKind) -> Result<(), NavigationError> {
        self.guard
            .begin(kind)
            .map_err(NavigationError::RequestInFlight)?;
        self.view.set_busy(true)
    }

    pub fn finish_request(&mut self) -> Result<(), NavigationError> {
        self.guard.finish();
        self.view.set_busy(false)
    }

    /// Show a failed request. The session and the visible page stay as they were.
    pub fn report_failure(&mut self, failure: &AnalysisFailure) -> Result<(), NavigationError> {
        self.view.show_error(&failure.user_message())
    }

    /// Show a refused user action such as generating with nothing selected
    pub fn report_error(&mut self, error: &NavigationError) -> Result<(), NavigationError> {
        self.view.show_error(&error.to_string())
    }

    /// Data behind the visible page: the results or the analysis. `None` on the input page.
    pub fn displayed_data(&self) -> Option<&AnalysisResult> {
        match self.visible {
            Page::Input => None,
            Page::Scenarios => self.session.analysis(),
            Page::Results => self.session.results(),
        }
    }

    /// Build the download for the visible page. `None` when there is nothing to export.
    pub fn export(
        &self,
        scope: ExportScope,
        exported_at: DateTime<Utc>,
    ) -> Result<Option<ExportFile>, NavigationError> {
        let Some(data) = self.displayed_data() else {
            return Ok(None);
        };
        build_export(data, self.session.accepted(), scope, exported_at)
    }

    pub(crate) fn restore_scenarios(
        &mut self,
        analysis: AnalysisResult,
        selections: &[Scenario],
    ) -> Result<(), NavigationError> {
        self.session.restore_analysis(analysis, selections);
        self.entry_page = Some(Page::Scenarios);
        self.show_scenarios(false)
    }

    pub(crate) fn restore_results(
        &mut self,
        results: AnalysisResult,
        accepted: &[String],
    ) -> Result<(), NavigationError> {
        self.session.restore_results(results, accepted);
        self.entry_page = Some(Page::Results);
        self.render_current_results()
    }

    pub(crate) fn restore_input(&mut self, force_reset: bool) -> Result<(), NavigationError> {
        self.entry_page = Some(Page::Input);
        self.show_input(force_reset)
    }

    fn render_current_results(&mut self) -> Result<(), NavigationError> {
        if let Some(results) = self.session.results() {
            self.view.render_results(results, self.session.accepted())?;
            self.visible = Page::Results;
        }
        Ok(())
    }

    /// Navigation state describing the visible page
    pub fn snapshot(&self) -> NavigationState {
        let selections = self.session.selections().as_slice().to_vec();
        match self.visible {
            Page::Input => NavigationState::input(),
            Page::Scenarios => NavigationState {
                page: Page::Scenarios,
                data: self.session.analysis().cloned(),
                selections,
                accepted: Vec::new(),
            },
            Page::Results => NavigationState {
                page: Page::Results,
                data: self.session.results().cloned(),
                selections,
                accepted: self.session.accepted().keys().map(str::to_string).collect(),
            },
        }
    }

    fn record(&mut self) -> Result<(), NavigationError> {
        let mode = if self.entry_page == Some(self.visible) {
            HistoryWrite::Replace
        } else {
            HistoryWrite::Push
        };
        let state = self.snapshot();
        self.history.write(mode, &state)?;
        self.entry_page = Some(self.visible);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;
    use crate::view::{Frame, HeadlessView};
    use pretty_assertions::assert_eq;
    use testcase_types::{DocumentType, TestCase};

    type Controller = PageController<MemoryHistory, HeadlessView>;

    fn analysis() -> AnalysisResult {
        AnalysisResult::new(
            DocumentType::Text,
            vec![
                Scenario::new("Login", "valid credentials").with_id("SC001"),
                Scenario::new("Logout", "session ends").with_id("SC002"),
            ],
        )
    }

    fn results() -> AnalysisResult {
        AnalysisResult::new(
            DocumentType::Text,
            vec![Scenario::new("Login", "valid credentials")
                .with_id("SC001")
                .with_test_cases(vec![
                    TestCase::new("correct password").with_id("SC001-TC01"),
                    TestCase::new("wrong password").with_id("SC001-TC02"),
                ])],
        )
    }

    fn controller() -> Controller {
        PageController::new(MemoryHistory::new(), HeadlessView::new())
    }

    #[test]
    fn test_analysis_pushes_scenarios_entry() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();

        assert_eq!(c.visible_page(), Page::Scenarios);
        assert_eq!(c.history().len(), 2);
        let state = c.history().current().unwrap().unwrap();
        assert_eq!(state.page, Page::Scenarios);
        assert_eq!(state.data.unwrap().scenarios.len(), 2);
    }

    #[test]
    fn test_second_analysis_replaces_entry() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        c.analysis_completed(analysis()).unwrap();
        assert_eq!(c.history().len(), 2);
    }

    #[test]
    fn test_toggle_rewrites_current_entry() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        assert!(c.toggle_scenario(1).unwrap());

        assert_eq!(c.history().len(), 2);
        let state = c.history().current().unwrap().unwrap();
        assert_eq!(state.selections.len(), 1);
        assert_eq!(state.selections[0].id.as_deref(), Some("SC002"));
        assert_eq!(
            c.view().frame(),
            &Frame::Scenarios {
                titles: vec!["Login".into(), "Logout".into()],
                selected: vec![false, true],
            }
        );
    }

    #[test]
    fn test_toggle_out_of_range() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        assert_eq!(c.toggle_scenario(5), Err(NavigationError::ScenarioOutOfRange(5)));
    }

    #[test]
    fn test_new_analysis_clears_selection() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        c.toggle_scenario(0).unwrap();
        c.analysis_completed(analysis()).unwrap();
        assert!(c.session().selections().is_empty());
    }

    #[test]
    fn test_empty_analysis_keeps_state() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        c.toggle_scenario(0).unwrap();

        c.analysis_completed(AnalysisResult::new(DocumentType::Text, Vec::new()))
            .unwrap();

        assert_eq!(c.visible_page(), Page::Scenarios);
        assert_eq!(c.session().selections().len(), 1);
        assert_eq!(c.view().errors().len(), 1);
    }

    #[test]
    fn test_results_pushes_and_accepts() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        c.toggle_scenario(0).unwrap();
        c.results_generated(results()).unwrap();

        assert_eq!(c.history().len(), 3);
        assert!(c.toggle_test_case(0, 1).unwrap());
        let state = c.history().current().unwrap().unwrap();
        assert_eq!(state.page, Page::Results);
        assert_eq!(state.accepted, vec!["SC001-TC02".to_string()]);
    }

    #[test]
    fn test_regenerating_results_clears_accepted() {
        let mut c = controller();
        c.results_generated(results()).unwrap();
        c.toggle_test_case(0, 0).unwrap();
        c.results_generated(results()).unwrap();
        assert!(c.session().accepted().is_empty());
    }

    #[test]
    fn test_show_scenarios_without_analysis_falls_back_to_input() {
        let mut c = controller();
        c.show_scenarios(true).unwrap();
        assert_eq!(c.visible_page(), Page::Input);
        assert_eq!(c.history().len(), 1);
    }

    #[test]
    fn test_request_guard_blocks_second_request() {
        let mut c = controller();
        c.begin_request(RequestKind::Analyze).unwrap();
        assert!(c.view().is_busy());
        assert_eq!(
            c.begin_request(RequestKind::Generate),
            Err(NavigationError::RequestInFlight(RequestKind::Analyze))
        );
        c.finish_request().unwrap();
        assert!(!c.is_busy());
        assert!(!c.view().is_busy());
    }

    #[test]
    fn test_select_all_then_none() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        c.select_all(true).unwrap();
        assert_eq!(c.selected_scenarios().unwrap().len(), 2);
        c.select_all(false).unwrap();
        assert_eq!(c.selected_scenarios(), Err(NavigationError::NothingSelected));
    }

    #[test]
    fn test_failure_leaves_page_alone() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        c.report_failure(&AnalysisFailure::Timeout).unwrap();
        assert_eq!(c.visible_page(), Page::Scenarios);
        assert!(c.view().errors()[0].contains("timed out"));
    }

    #[test]
    fn test_refused_action_is_shown() {
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        let refused = c.selected_scenarios().unwrap_err();
        c.report_error(&refused).unwrap();
        assert_eq!(c.view().errors(), ["Select at least one scenario first".to_string()]);
        assert_eq!(c.visible_page(), Page::Scenarios);
    }

    #[test]
    fn test_export_follows_visible_page() {
        let at = chrono::DateTime::from_timestamp(1_767_225_600, 0).unwrap();
        let mut c = controller();
        c.analysis_completed(analysis()).unwrap();
        c.results_generated(results()).unwrap();

        c.show_scenarios(false).unwrap();
        let file = c.export(ExportScope::All, at).unwrap().unwrap();
        let exported: AnalysisResult = serde_json::from_str(&file.contents).unwrap();
        assert_eq!(exported.scenarios.len(), 2);
        assert!(exported.scenarios.iter().all(|s| s.test_cases.is_empty()));

        c.show_results(results(), false).unwrap();
        let file = c.export(ExportScope::All, at).unwrap().unwrap();
        let exported: AnalysisResult = serde_json::from_str(&file.contents).unwrap();
        assert_eq!(exported.scenarios.len(), 1);
        assert_eq!(exported.scenarios[0].test_cases.len(), 2);

        c.show_input(false).unwrap();
        assert_eq!(c.export(ExportScope::All, at).unwrap(), None);
    }
}
