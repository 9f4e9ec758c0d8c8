//! Scenario selection and test case acceptance

use std::collections::BTreeSet;

use testcase_types::{AnalysisResult, Scenario};

/// Scenarios checked for detailed generation, in the order they were picked
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    scenarios: Vec<Scenario>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `scenario`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, scenario: &Scenario) -> bool {
        match self.scenarios.iter().position(|s| s.same_target(scenario)) {
            Some(pos) => {
                self.scenarios.remove(pos);
                false
            }
            None => {
                self.scenarios.push(scenario.clone());
                true
            }
        }
    }

    pub fn insert(&mut self, scenario: &Scenario) {
        if !self.contains(scenario) {
            self.scenarios.push(scenario.clone());
        }
    }

    pub fn contains(&self, scenario: &Scenario) -> bool {
        self.scenarios.iter().any(|s| s.same_target(scenario))
    }

    pub fn clear(&mut self) {
        self.scenarios.clear();
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn as_slice(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Rebuild a selection from stored scenarios, keeping only those still
    /// present in `analysis`.
    pub fn restore(stored: &[Scenario], analysis: &AnalysisResult) -> Self {
        let mut set = Self::new();
        for scenario in stored {
            if let Some(current) = analysis.scenarios.iter().find(|s| s.same_target(scenario)) {
                set.insert(current);
            }
        }
        set
    }
}

/// Keys of accepted test cases on the results page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptedSet {
    keys: BTreeSet<String>,
}

impl AcceptedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `key` is accepted after the toggle
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.to_string());
            true
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Rebuild from stored keys, dropping any that no test case in `results` carries
    pub fn restore<'a>(stored: impl IntoIterator<Item = &'a String>, results: &AnalysisResult) -> Self {
        let present = result_keys(results);
        Self {
            keys: stored
                .into_iter()
                .filter(|key| present.contains(key.as_str()))
                .cloned()
                .collect(),
        }
    }
}

/// Every test case key of `results`, using the positional fallback where needed
pub fn result_keys(results: &AnalysisResult) -> BTreeSet<String> {
    results
        .scenarios
        .iter()
        .enumerate()
        .flat_map(|(s, scenario)| {
            scenario
                .test_cases
                .iter()
                .enumerate()
                .map(move |(t, tc)| tc.key(s, t))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use testcase_types::{DocumentType, TestCase};

    fn scenario(id: &str, title: &str) -> Scenario {
        Scenario::new(title, format!("{} description", title)).with_id(id)
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut set = SelectionSet::new();
        let s = scenario("SC001", "Login");
        assert!(set.toggle(&s));
        assert!(set.contains(&s));
        assert!(!set.toggle(&s));
        assert!(set.is_empty());
    }

    #[test]
    fn test_toggle_matches_by_id_not_text() {
        let mut set = SelectionSet::new();
        set.toggle(&scenario("SC001", "Login"));
        // Same id with edited text still refers to the selected scenario
        assert!(!set.toggle(&Scenario::new("Renamed", "x").with_id("SC001")));
        assert!(set.is_empty());
    }

    #[test]
    fn test_restore_drops_unknown_scenarios() {
        let analysis = AnalysisResult::new(
            DocumentType::Text,
            vec![scenario("SC001", "Login"), scenario("SC002", "Logout")],
        );
        let stored = vec![scenario("SC002", "Logout"), scenario("SC099", "Gone")];
        let set = SelectionSet::restore(&stored, &analysis);
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].id.as_deref(), Some("SC002"));
    }

    #[test]
    fn test_accepted_restore_keeps_present_keys_only() {
        let results = AnalysisResult::new(
            DocumentType::Text,
            vec![scenario("SC001", "Login").with_test_cases(vec![
                TestCase::new("valid").with_id("SC001-TC01"),
                TestCase::new("invalid"),
            ])],
        );
        let stored = vec![
            "SC001-TC01".to_string(),
            "idx:0-1".to_string(),
            "SC404-TC01".to_string(),
        ];
        let accepted = AcceptedSet::restore(&stored, &results);
        assert_eq!(accepted.keys().collect::<Vec<_>>(), vec!["SC001-TC01", "idx:0-1"]);
    }

    #[test]
    fn test_accepted_toggle() {
        let mut accepted = AcceptedSet::new();
        assert!(accepted.toggle("TC1"));
        assert!(accepted.contains("TC1"));
        assert!(!accepted.toggle("TC1"));
        assert!(accepted.is_empty());
    }
}
