//! Stable id assignment for model output
//!
//! Clients key acceptance state by test case id. Anything the model returned
//! without an id gets a positional one here, before it leaves the server.

use std::collections::HashSet;

use crate::types::Scenario;

/// Fill in missing or repeated scenario and test case ids.
///
/// Scenario ids are `<prefix>NNN`, test case ids `<scenario id>-TCNN`. The
/// first occurrence of a model-supplied id is kept. Test case ids are unique
/// across the whole result, so a model that restarts `TC001` in every scenario
/// still yields one key per test case.
pub fn assign_stable_ids(scenarios: &mut [Scenario], prefix: &str) {
    let mut taken: HashSet<String> = scenarios
        .iter()
        .filter_map(|s| s.id.clone())
        .filter(|id| !id.is_empty())
        .collect();
    let mut seen = HashSet::new();
    let mut counter = 0usize;

    for scenario in scenarios.iter_mut() {
        let keep = scenario
            .id
            .as_deref()
            .map_or(false, |id| !id.is_empty() && seen.insert(id.to_string()));
        if !keep {
            let id = next_free(&mut counter, &taken, |n| format!("{}{:03}", prefix, n));
            taken.insert(id.clone());
            seen.insert(id.clone());
            scenario.id = Some(id);
        }
    }

    let mut case_taken: HashSet<String> = scenarios
        .iter()
        .flat_map(|s| s.test_cases.iter().filter_map(|tc| tc.id.clone()))
        .filter(|id| !id.is_empty())
        .collect();
    let mut case_seen = HashSet::new();

    for scenario in scenarios.iter_mut() {
        let scenario_id = scenario.id.clone().unwrap_or_default();
        let mut case_counter = 0usize;

        for test_case in scenario.test_cases.iter_mut() {
            let keep = test_case
                .id
                .as_deref()
                .map_or(false, |id| !id.is_empty() && case_seen.insert(id.to_string()));
            if !keep {
                let id = next_free(&mut case_counter, &case_taken, |n| {
                    format!("{}-TC{:02}", scenario_id, n)
                });
                case_taken.insert(id.clone());
                case_seen.insert(id.clone());
                test_case.id = Some(id);
            }
        }
    }
}

fn next_free(counter: &mut usize, taken: &HashSet<String>, format: impl Fn(usize) -> String) -> String {
    loop {
        *counter += 1;
        let candidate = format(*counter);
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestCase;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_assigns_missing_ids() {
        let mut scenarios = vec![
            Scenario::new("A", "").with_test_cases(vec![TestCase::new("a1"), TestCase::new("a2")]),
            Scenario::new("B", ""),
        ];
        assign_stable_ids(&mut scenarios, "SC");

        assert_eq!(scenarios[0].id.as_deref(), Some("SC001"));
        assert_eq!(scenarios[1].id.as_deref(), Some("SC002"));
        assert_eq!(scenarios[0].test_cases[0].id.as_deref(), Some("SC001-TC01"));
        assert_eq!(scenarios[0].test_cases[1].id.as_deref(), Some("SC001-TC02"));
    }

    #[test]
    fn test_keeps_model_ids_and_avoids_collisions() {
        let mut scenarios = vec![
            Scenario::new("A", ""),
            Scenario::new("B", "").with_id("SC001"),
        ];
        assign_stable_ids(&mut scenarios, "SC");

        assert_eq!(scenarios[0].id.as_deref(), Some("SC002"));
        assert_eq!(scenarios[1].id.as_deref(), Some("SC001"));
    }

    #[test]
    fn test_api_prefix() {
        let mut scenarios = vec![Scenario::new("Auth", "")];
        assign_stable_ids(&mut scenarios, "API_SC");
        assert_eq!(scenarios[0].id.as_deref(), Some("API_SC001"));
    }

    #[test]
    fn test_repeated_case_ids_are_renamed_per_result() {
        let mut scenarios = vec![
            Scenario::new("A", "").with_test_cases(vec![TestCase::new("a1").with_id("TC001")]),
            Scenario::new("B", "").with_test_cases(vec![
                TestCase::new("b1").with_id("TC001"),
                TestCase::new("b2").with_id("TC002"),
            ]),
        ];
        assign_stable_ids(&mut scenarios, "SC");

        assert_eq!(scenarios[0].test_cases[0].id.as_deref(), Some("TC001"));
        assert_eq!(scenarios[1].test_cases[0].id.as_deref(), Some("SC002-TC01"));
        assert_eq!(scenarios[1].test_cases[1].id.as_deref(), Some("TC002"));
    }

    #[test]
    fn test_repeated_scenario_ids_are_renamed() {
        let mut scenarios = vec![
            Scenario::new("A", "").with_id("SC001"),
            Scenario::new("B", "").with_id("SC001"),
        ];
        assign_stable_ids(&mut scenarios, "SC");

        assert_eq!(scenarios[0].id.as_deref(), Some("SC001"));
        assert_eq!(scenarios[1].id.as_deref(), Some("SC002"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn assigned_case_ids_are_unique(ids in prop::collection::vec(prop::collection::vec("TC00[1-3]", 0..4), 1..5)) {
                let mut scenarios: Vec<Scenario> = ids
                    .iter()
                    .map(|cases| {
                        Scenario::new("s", "").with_test_cases(
                            cases.iter().map(|id| TestCase::new("t").with_id(id.clone())).collect(),
                        )
                    })
                    .collect();
                assign_stable_ids(&mut scenarios, "SC");

                let all: Vec<String> = scenarios
                    .iter()
                    .flat_map(|s| s.test_cases.iter().filter_map(|tc| tc.id.clone()))
                    .collect();
                let unique: HashSet<&String> = all.iter().collect();
                prop_assert_eq!(unique.len(), all.len());
            }
        }
    }
}
