//! Full front end flow against canned server responses

use chrono::Utc;
use navigator_core::{
    classify_response, handle_pop_state, ExportScope, Frame, HeadlessView, MemoryHistory, Page,
    PageController, RequestKind,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use testcase_types::{assign_stable_ids, AnalysisResult, DocumentType, Scenario, TestCase};

/// What the mock backend answers for both /analyze and /generate
fn mock_backend(description: &str) -> (u16, String) {
    assert_eq!(description, "User login with email validation");
    let body = json!({
        "scenarios": [{
            "id": "SC001",
            "title": "User login with email validation",
            "description": "Users sign in with a syntactically valid email",
            "priority": "high",
            "category": "functional",
            "test_cases": [
                {
                    "id": "SC001-TC01",
                    "title": "Valid email and password",
                    "steps": ["Open login", "Enter valid email", "Submit"],
                    "expected_result": "User is signed in",
                    "priority": "high"
                },
                {
                    "id": "SC001-TC02",
                    "title": "Malformed email",
                    "steps": ["Open login", "Enter 'user@'", "Submit"],
                    "expected_result": "Validation error is shown",
                    "priority": "medium"
                }
            ]
        }],
        "document_type": "text",
        "input_type": "description",
        "generated_at": "2026-05-01T12:00:00Z"
    });
    (200, body.to_string())
}

#[test]
fn login_flow_exports_one_accepted_test_case() {
    let mut app = PageController::new(MemoryHistory::new(), HeadlessView::new());
    let description = "User login with email validation";

    app.begin_request(RequestKind::Analyze).unwrap();
    let (status, body) = mock_backend(description);
    let analysis = classify_response(status, &body).unwrap();
    app.finish_request().unwrap();
    assert!(analysis.is_clean());
    app.analysis_completed(analysis.value).unwrap();
    assert_eq!(app.visible_page(), Page::Scenarios);

    assert!(app.toggle_scenario(0).unwrap());
    let selected = app.selected_scenarios().unwrap();
    assert_eq!(selected.len(), 1);

    app.begin_request(RequestKind::Generate).unwrap();
    let (status, body) = mock_backend(description);
    let results = classify_response(status, &body).unwrap();
    app.finish_request().unwrap();
    app.results_generated(results.value).unwrap();
    assert_eq!(app.visible_page(), Page::Results);

    assert!(app.toggle_test_case(0, 1).unwrap());

    let file = app
        .export(ExportScope::Accepted, Utc::now())
        .unwrap()
        .expect("one accepted test case");
    let exported: AnalysisResult = serde_json::from_str(&file.contents).unwrap();
    assert_eq!(exported.scenarios.len(), 1);
    assert_eq!(exported.scenarios[0].test_cases.len(), 1);
    assert_eq!(exported.scenarios[0].test_cases[0].title, "Malformed email");
}

#[test]
fn export_accepted_without_acceptances_produces_nothing() {
    let mut app = PageController::new(MemoryHistory::new(), HeadlessView::new());
    let (status, body) = mock_backend("User login with email validation");
    app.results_generated(classify_response(status, &body).unwrap().value)
        .unwrap();

    assert_eq!(app.export(ExportScope::Accepted, Utc::now()).unwrap(), None);
    assert!(app.export(ExportScope::All, Utc::now()).unwrap().is_some());
}

#[test]
fn failed_generation_keeps_scenarios_page() {
    let mut app = PageController::new(MemoryHistory::new(), HeadlessView::new());
    let (status, body) = mock_backend("User login with email validation");
    app.analysis_completed(classify_response(status, &body).unwrap().value)
        .unwrap();
    app.toggle_scenario(0).unwrap();

    let failure = classify_response(500, r#"{"error":"upstream model unavailable","status":500}"#)
        .unwrap_err();
    app.report_failure(&failure).unwrap();

    assert_eq!(app.visible_page(), Page::Scenarios);
    assert_eq!(app.session().selections().len(), 1);
    assert_eq!(
        app.view().errors(),
        &["Analysis failed: upstream model unavailable".to_string()]
    );

    // Back to the blank initial entry and forward again restores the selection
    let state = app.history_mut().back().unwrap().unwrap();
    handle_pop_state(&mut app, state).unwrap();
    assert_eq!(app.visible_page(), Page::Input);
    let state = app.history_mut().forward().unwrap().unwrap();
    handle_pop_state(&mut app, state).unwrap();
    assert_eq!(app.session().selections().len(), 1);
}

#[test]
fn accepting_a_case_with_a_repeated_model_id_exports_only_that_case() {
    let mut scenarios = vec![
        Scenario::new("Login", "valid credentials")
            .with_test_cases(vec![TestCase::new("Correct password").with_id("TC001")]),
        Scenario::new("Logout", "active session")
            .with_test_cases(vec![TestCase::new("Session cleared").with_id("TC001")]),
    ];
    assign_stable_ids(&mut scenarios, "SC");
    let mut app = PageController::new(MemoryHistory::new(), HeadlessView::new());
    app.results_generated(AnalysisResult::new(DocumentType::Text, scenarios))
        .unwrap();

    assert!(app.toggle_test_case(1, 0).unwrap());

    assert_eq!(
        app.view().frame(),
        &Frame::Results {
            titles: vec!["Login".to_string(), "Logout".to_string()],
            accepted: vec![vec![false], vec![true]],
        }
    );
    let file = app
        .export(ExportScope::Accepted, Utc::now())
        .unwrap()
        .expect("one accepted test case");
    let exported: AnalysisResult = serde_json::from_str(&file.contents).unwrap();
    assert_eq!(exported.scenarios.len(), 1);
    assert_eq!(exported.scenarios[0].title, "Logout");
    assert_eq!(exported.scenarios[0].test_cases[0].title, "Session cleared");
}
