//! Back/forward handling

use crate::controller::PageController;
use crate::error::NavigationError;
use crate::history::HistoryBackend;
use crate::state::{NavigationState, Page};
use crate::view::PageView;

/// Rebuild the UI from the state of the history entry the browser moved to.
///
/// An entry without state is the initial page load and resets to a blank input
/// form. Restoration never issues a network request and never writes history.
pub fn handle_pop_state<H: HistoryBackend, V: PageView>(
    controller: &mut PageController<H, V>,
    state: Option<NavigationState>,
) -> Result<(), NavigationError> {
    let Some(state) = state else {
        return controller.restore_input(true);
    };

    match (state.page, state.data) {
        (Page::Scenarios, Some(analysis)) => {
            controller.restore_scenarios(analysis, &state.selections)
        }
        (Page::Results, Some(results)) => controller.restore_results(results, &state.accepted),
        (Page::Input, _) => controller.restore_input(false),
        // A scenarios or results entry without data cannot be shown
        (_, None) => controller.restore_input(true),
    }
}

/// Parse the raw JSON stored in a history entry.
///
/// Unreadable state is treated like a missing one.
pub fn decode_state(raw: Option<&str>) -> Option<NavigationState> {
    raw.and_then(|json| NavigationState::from_json(json).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistory;
    use crate::view::{Frame, HeadlessView};
    use pretty_assertions::assert_eq;
    use testcase_types::{AnalysisResult, DocumentType, Scenario, TestCase};

    fn analysis() -> AnalysisResult {
        AnalysisResult::new(
            DocumentType::Text,
            vec![
                Scenario::new("Login", "valid").with_id("SC001"),
                Scenario::new("Signup", "new user").with_id("SC002"),
            ],
        )
    }

    fn results() -> AnalysisResult {
        AnalysisResult::new(
            DocumentType::Text,
            vec![Scenario::new("Login", "valid")
                .with_id("SC001")
                .with_test_cases(vec![TestCase::new("ok").with_id("SC001-TC01")])],
        )
    }

    fn pop(c: &mut PageController<MemoryHistory, HeadlessView>, back: bool) {
        let state = if back {
            c.history_mut().back()
        } else {
            c.history_mut().forward()
        }
        .expect("history entry")
        .unwrap();
        handle_pop_state(c, state).unwrap();
    }

    #[test]
    fn test_back_to_initial_entry_resets() {
        let mut c = PageController::new(MemoryHistory::new(), HeadlessView::new());
        c.analysis_completed(analysis()).unwrap();
        c.toggle_scenario(0).unwrap();

        pop(&mut c, true);
        assert_eq!(c.visible_page(), Page::Input);
        assert_eq!(c.view().frame(), &Frame::Input { reset: true });
        assert!(c.session().analysis().is_none());
        assert!(c.session().selections().is_empty());
    }

    #[test]
    fn test_back_from_results_restores_selection() {
        let mut c = PageController::new(MemoryHistory::new(), HeadlessView::new());
        c.analysis_completed(analysis()).unwrap();
        c.toggle_scenario(1).unwrap();
        c.results_generated(results()).unwrap();
        c.toggle_test_case(0, 0).unwrap();

        pop(&mut c, true);
        assert_eq!(
            c.view().frame(),
            &Frame::Scenarios {
                titles: vec!["Login".into(), "Signup".into()],
                selected: vec![false, true],
            }
        );

        pop(&mut c, false);
        assert_eq!(
            c.view().frame(),
            &Frame::Results {
                titles: vec!["Login".into()],
                accepted: vec![vec![true]],
            }
        );
        assert_eq!(c.history().len(), 3);
    }

    #[test]
    fn test_toggle_after_back_replaces_that_entry() {
        let mut c = PageController::new(MemoryHistory::new(), HeadlessView::new());
        c.analysis_completed(analysis()).unwrap();
        c.results_generated(results()).unwrap();

        pop(&mut c, true);
        c.toggle_scenario(0).unwrap();

        // The results entry is still reachable
        assert_eq!(c.history().len(), 3);
        let current = c.history().current().unwrap().unwrap();
        assert_eq!(current.page, Page::Scenarios);
        assert_eq!(current.selections.len(), 1);
    }

    #[test]
    fn test_decode_state_tolerates_garbage() {
        assert_eq!(decode_state(None), None);
        assert_eq!(decode_state(Some("not json")), None);
        assert_eq!(
            decode_state(Some(r#"{"page":"input"}"#)).map(|s| s.page),
            Some(Page::Input)
        );
    }
}
