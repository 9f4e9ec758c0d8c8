//! Cross-page state owned by the page controller

use testcase_types::{AnalysisResult, Scenario};

use crate::selection::{AcceptedSet, SelectionSet};

/// The last analysis, the last detailed results and what the user picked in them
#[derive(Debug, Clone, Default)]
pub struct Session {
    analysis: Option<AnalysisResult>,
    results: Option<AnalysisResult>,
    selections: SelectionSet,
    accepted: AcceptedSet,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn results(&self) -> Option<&AnalysisResult> {
        self.results.as_ref()
    }

    pub fn selections(&self) -> &SelectionSet {
        &self.selections
    }

    pub fn accepted(&self) -> &AcceptedSet {
        &self.accepted
    }

    /// Install a fresh analysis. Previous selections, results and acceptances go away.
    pub fn replace_analysis(&mut self, analysis: AnalysisResult) {
        self.analysis = Some(analysis);
        self.results = None;
        self.selections.clear();
        self.accepted.clear();
    }

    /// Install freshly generated results; acceptances start over
    pub fn replace_results(&mut self, results: AnalysisResult) {
        self.results = Some(results);
        self.accepted.clear();
    }

    /// Show `results` while keeping acceptances that still point into them
    pub fn display_results(&mut self, results: AnalysisResult) {
        let keys: Vec<String> = self.accepted.keys().map(str::to_string).collect();
        self.accepted = AcceptedSet::restore(&keys, &results);
        self.results = Some(results);
    }

    pub fn restore_analysis(&mut self, analysis: AnalysisResult, selections: &[Scenario]) {
        self.selections = SelectionSet::restore(selections, &analysis);
        self.analysis = Some(analysis);
    }

    pub fn restore_results(&mut self, results: AnalysisResult, accepted: &[String]) {
        self.accepted = AcceptedSet::restore(accepted, &results);
        self.results = Some(results);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn selections_mut(&mut self) -> &mut SelectionSet {
        &mut self.selections
    }

    pub fn accepted_mut(&mut self) -> &mut AcceptedSet {
        &mut self.accepted
    }

    /// Selected scenarios in the order the analysis lists them
    pub fn selected_scenarios(&self) -> Vec<Scenario> {
        self.analysis
            .iter()
            .flat_map(|a| a.scenarios.iter())
            .filter(|s| self.selections.contains(s))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testcase_types::{DocumentType, TestCase};

    fn analysis(titles: &[&str]) -> AnalysisResult {
        AnalysisResult::new(
            DocumentType::Text,
            titles
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    Scenario::new(*t, "desc")
                        .with_id(format!("SC{:03}", i + 1))
                        .with_test_cases(vec![TestCase::new("case").with_id(format!("SC{:03}-TC01", i + 1))])
                })
                .collect(),
        )
    }

    #[test]
    fn test_replace_analysis_clears_both_sets() {
        let mut session = Session::new();
        let first = analysis(&["Login", "Logout"]);
        session.replace_analysis(first.clone());
        session.selections_mut().toggle(&first.scenarios[0]);
        session.replace_results(first.clone());
        session.accepted_mut().toggle("SC001-TC01");

        session.replace_analysis(analysis(&["Search"]));
        assert!(session.selections().is_empty());
        assert!(session.accepted().is_empty());
        assert!(session.results().is_none());
    }

    #[test]
    fn test_selected_scenarios_follow_analysis_order() {
        let mut session = Session::new();
        let a = analysis(&["A", "B", "C"]);
        session.replace_analysis(a.clone());
        session.selections_mut().toggle(&a.scenarios[2]);
        session.selections_mut().toggle(&a.scenarios[0]);

        let titles: Vec<_> = session
            .selected_scenarios()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[test]
    fn test_display_results_prunes_stale_keys() {
        let mut session = Session::new();
        session.replace_results(analysis(&["A", "B"]));
        session.accepted_mut().toggle("SC002-TC01");
        session.display_results(analysis(&["A"]));
        assert!(session.accepted().is_empty());
    }
}
