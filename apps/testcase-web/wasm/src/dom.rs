//! DOM rendering for the three pages
//!
//! The view only draws. Click handling stays in the page script, which calls
//! back into [`crate::TestCaseApp`] with the `data-*` indices written here.

use navigator_core::{AcceptedSet, NavigationError, Page, PageView, SelectionSet};
use testcase_types::{AnalysisResult, Scenario, TestCase};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlInputElement, HtmlTextAreaElement};

pub const INPUT_SECTION: &str = "input-section";
pub const SCENARIOS_SECTION: &str = "scenarios-section";
pub const RESULTS_SECTION: &str = "results-section";
pub const SCENARIOS_LIST: &str = "scenarios-list";
pub const RESULTS_LIST: &str = "results-list";
pub const ANALYSIS_SUMMARY: &str = "analysis-summary";
pub const ERROR_MESSAGE: &str = "error-message";
pub const LOADING: &str = "loading";

const TEXT_INPUTS: &[&str] = &["description", "website-url"];
const FILE_INPUTS: &[&str] = &["image-input", "api-file-input"];

/// One line describing where an analysis came from
pub fn summary(analysis: &AnalysisResult) -> String {
    let count = analysis.scenarios.len();
    if let Some(api) = &analysis.api_info {
        return format!(
            "{}: {} scenarios for {} endpoints",
            api.title, count, api.endpoints_count
        );
    }
    if let Some(site) = &analysis.website_info {
        return format!(
            "{} rated {:.1}/10, {} API endpoints found, {} scenarios",
            site.url, site.overall_rating, site.api_endpoints_found, count
        );
    }
    format!("{} scenarios from {} input", count, analysis.document_type)
}

pub fn accept_label(accepted: bool) -> &'static str {
    if accepted {
        "Accepted"
    } else {
        "Accept"
    }
}

fn render_error(e: JsValue) -> NavigationError {
    NavigationError::Render(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

pub struct DomView {
    document: Document,
}

impl DomView {
    pub fn new() -> Result<Self, JsValue> {
        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document object available"))?;
        Ok(Self { document })
    }

    fn element(&self, id: &str) -> Result<Element, JsValue> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| JsValue::from_str(&format!("Missing element #{}", id)))
    }

    fn create(&self, tag: &str, class: &str, text: Option<&str>) -> Result<Element, JsValue> {
        let element = self.document.create_element(tag)?;
        if !class.is_empty() {
            element.set_class_name(class);
        }
        if text.is_some() {
            element.set_text_content(text);
        }
        Ok(element)
    }

    fn show_only(&self, page: Page) -> Result<(), JsValue> {
        for (id, shown) in [
            (INPUT_SECTION, page == Page::Input),
            (SCENARIOS_SECTION, page == Page::Scenarios),
            (RESULTS_SECTION, page == Page::Results),
        ] {
            self.element(id)?.toggle_attribute_with_force("hidden", !shown)?;
        }
        self.clear_error()
    }

    fn clear_error(&self) -> Result<(), JsValue> {
        let error = self.element(ERROR_MESSAGE)?;
        error.set_text_content(None);
        error.toggle_attribute_with_force("hidden", true)?;
        Ok(())
    }

    fn reset_inputs(&self) -> Result<(), JsValue> {
        for id in TEXT_INPUTS.iter().chain(FILE_INPUTS) {
            let Some(element) = self.document.get_element_by_id(id) else {
                continue;
            };
            if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
                input.set_value("");
            } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
                area.set_value("");
            }
        }
        Ok(())
    }

    fn scenario_card(
        &self,
        index: usize,
        scenario: &Scenario,
        selected: bool,
    ) -> Result<Element, JsValue> {
        let card = self.create("div", "scenario-card", None)?;
        card.set_attribute("data-index", &index.to_string())?;
        card.class_list().toggle_with_force("selected", selected)?;

        let label = self.create("label", "scenario-header", None)?;
        let checkbox: HtmlInputElement = self.create("input", "scenario-checkbox", None)?.dyn_into()?;
        checkbox.set_type("checkbox");
        checkbox.set_checked(selected);
        checkbox.set_attribute("data-index", &index.to_string())?;
        label.append_child(&checkbox)?;
        label.append_child(&self.create("h3", "", Some(scenario.title.as_str()))?.into())?;
        card.append_child(&label)?;

        card.append_child(&self.create("p", "description", Some(scenario.description.as_str()))?.into())?;
        card.append_child(&self.meta(scenario.priority.as_str(), &scenario.category)?.into())?;
        if !scenario.test_cases.is_empty() {
            let count = format!("{} test cases", scenario.test_cases.len());
            card.append_child(&self.create("span", "test-case-count", Some(count.as_str()))?.into())?;
        }
        Ok(card)
    }

    fn meta(&self, priority: &str, category: &str) -> Result<Element, JsValue> {
        let meta = self.create("div", "meta", None)?;
        meta.append_child(&self.create("span", &format!("badge priority-{}", priority), Some(priority))?.into())?;
        if !category.is_empty() {
            meta.append_child(&self.create("span", "badge category", Some(category))?.into())?;
        }
        Ok(meta)
    }

    fn result_card(
        &self,
        index: usize,
        scenario: &Scenario,
        accepted: &AcceptedSet,
    ) -> Result<Element, JsValue> {
        let card = self.create("div", "result-card", None)?;
        card.set_attribute("data-index", &index.to_string())?;
        card.append_child(&self.create("h3", "", Some(scenario.title.as_str()))?.into())?;
        card.append_child(&self.create("p", "description", Some(scenario.description.as_str()))?.into())?;
        card.append_child(&self.meta(scenario.priority.as_str(), &scenario.category)?.into())?;

        let list = self.create("div", "test-cases", None)?;
        for (case_index, test_case) in scenario.test_cases.iter().enumerate() {
            let is_accepted = accepted.contains(&test_case.key(index, case_index));
            list.append_child(&self.test_case_item(index, case_index, test_case, is_accepted)?.into())?;
        }
        card.append_child(&list)?;
        Ok(card)
    }

    fn test_case_item(
        &self,
        scenario_index: usize,
        case_index: usize,
        test_case: &TestCase,
        accepted: bool,
    ) -> Result<Element, JsValue> {
        let item = self.create("div", "test-case", None)?;
        item.set_attribute("data-scenario", &scenario_index.to_string())?;
        item.set_attribute("data-case", &case_index.to_string())?;
        item.class_list().toggle_with_force("accepted", accepted)?;

        let heading = match test_case.id.as_deref() {
            Some(id) if !id.is_empty() => format!("{} {}", id, test_case.title),
            _ => test_case.title.clone(),
        };
        item.append_child(&self.create("h4", "", Some(heading.as_str()))?.into())?;
        if !test_case.description.is_empty() {
            item.append_child(&self.create("p", "description", Some(test_case.description.as_str()))?.into())?;
        }

        if !test_case.steps.is_empty() {
            let steps = self.create("ol", "steps", None)?;
            for step in &test_case.steps {
                steps.append_child(&self.create("li", "", Some(step.as_str()))?.into())?;
            }
            item.append_child(&steps)?;
        }
        if !test_case.expected_result.is_empty() {
            let expected = format!("Expected: {}", test_case.expected_result);
            item.append_child(&self.create("p", "expected", Some(expected.as_str()))?.into())?;
        }

        let button: HtmlButtonElement = self
            .create("button", "accept-btn", Some(accept_label(accepted)))?
            .dyn_into()?;
        button.set_type("button");
        button.set_attribute("data-scenario", &scenario_index.to_string())?;
        button.set_attribute("data-case", &case_index.to_string())?;
        item.append_child(&button)?;
        Ok(item)
    }

    fn replace_children(&self, id: &str, children: Vec<Element>) -> Result<(), JsValue> {
        let container = self.element(id)?;
        container.set_text_content(None);
        for child in children {
            container.append_child(&child)?;
        }
        Ok(())
    }

    fn draw_scenarios(
        &self,
        analysis: &AnalysisResult,
        selections: &SelectionSet,
    ) -> Result<(), JsValue> {
        let cards = analysis
            .scenarios
            .iter()
            .enumerate()
            .map(|(i, s)| self.scenario_card(i, s, selections.contains(s)))
            .collect::<Result<Vec<_>, _>>()?;
        self.replace_children(SCENARIOS_LIST, cards)?;
        self.element(ANALYSIS_SUMMARY)?
            .set_text_content(Some(summary(analysis).as_str()));
        self.show_only(Page::Scenarios)
    }

    fn draw_results(&self, results: &AnalysisResult, accepted: &AcceptedSet) -> Result<(), JsValue> {
        let cards = results
            .scenarios
            .iter()
            .enumerate()
            .map(|(i, s)| self.result_card(i, s, accepted))
            .collect::<Result<Vec<_>, _>>()?;
        self.replace_children(RESULTS_LIST, cards)?;
        self.show_only(Page::Results)
    }

    fn draw_input(&self, reset_fields: bool) -> Result<(), JsValue> {
        if reset_fields {
            self.reset_inputs()?;
            self.replace_children(SCENARIOS_LIST, Vec::new())?;
            self.replace_children(RESULTS_LIST, Vec::new())?;
        }
        self.show_only(Page::Input)
    }

    fn set_scenario_mark(&self, index: usize, selected: bool) -> Result<(), JsValue> {
        let selector = format!("#{} .scenario-card[data-index=\"{}\"]", SCENARIOS_LIST, index);
        let Some(card) = self.document.query_selector(&selector)? else {
            return Ok(());
        };
        card.class_list().toggle_with_force("selected", selected)?;
        if let Some(checkbox) = card.query_selector(".scenario-checkbox")? {
            if let Some(input) = checkbox.dyn_ref::<HtmlInputElement>() {
                input.set_checked(selected);
            }
        }
        Ok(())
    }

    fn set_test_case_mark(
        &self,
        scenario_index: usize,
        case_index: usize,
        accepted: bool,
    ) -> Result<(), JsValue> {
        let selector = format!(
            "#{} .test-case[data-scenario=\"{}\"][data-case=\"{}\"]",
            RESULTS_LIST, scenario_index, case_index
        );
        let Some(item) = self.document.query_selector(&selector)? else {
            return Ok(());
        };
        item.class_list().toggle_with_force("accepted", accepted)?;
        if let Some(button) = item.query_selector(".accept-btn")? {
            button.set_text_content(Some(accept_label(accepted)));
        }
        Ok(())
    }

    fn draw_error(&self, message: &str) -> Result<(), JsValue> {
        let error = self.element(ERROR_MESSAGE)?;
        error.set_text_content(Some(message));
        error.toggle_attribute_with_force("hidden", false)?;
        Ok(())
    }

    fn draw_busy(&self, busy: bool) -> Result<(), JsValue> {
        let triggers = self.document.query_selector_all("[data-request-trigger]")?;
        for i in 0..triggers.length() {
            if let Some(button) = triggers
                .get(i)
                .and_then(|node| node.dyn_into::<HtmlButtonElement>().ok())
            {
                button.set_disabled(busy);
            }
        }
        if let Some(loading) = self.document.get_element_by_id(LOADING) {
            loading.toggle_attribute_with_force("hidden", !busy)?;
        }
        Ok(())
    }
}

impl PageView for DomView {
    fn render_input(&mut self, reset_fields: bool) -> Result<(), NavigationError> {
        self.draw_input(reset_fields).map_err(render_error)
    }

    fn render_scenarios(
        &mut self,
        analysis: &AnalysisResult,
        selections: &SelectionSet,
    ) -> Result<(), NavigationError> {
        self.draw_scenarios(analysis, selections).map_err(render_error)
    }

    fn render_results(
        &mut self,
        results: &AnalysisResult,
        accepted: &AcceptedSet,
    ) -> Result<(), NavigationError> {
        self.draw_results(results, accepted).map_err(render_error)
    }

    fn mark_scenario(&mut self, index: usize, selected: bool) -> Result<(), NavigationError> {
        self.set_scenario_mark(index, selected).map_err(render_error)
    }

    fn mark_test_case(
        &mut self,
        scenario_index: usize,
        case_index: usize,
        accepted: bool,
    ) -> Result<(), NavigationError> {
        self.set_test_case_mark(scenario_index, case_index, accepted)
            .map_err(render_error)
    }

    fn show_error(&mut self, message: &str) -> Result<(), NavigationError> {
        self.draw_error(message).map_err(render_error)
    }

    fn set_busy(&mut self, busy: bool) -> Result<(), NavigationError> {
        self.draw_busy(busy).map_err(render_error)
    }
}
