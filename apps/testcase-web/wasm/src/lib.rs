//! WASM front end for the test case generator
//!
//! Page state lives in a [`PageController`] from navigator-core; this crate
//! binds it to `window.history`, the DOM and `fetch`. JavaScript only wires
//! DOM events to the methods of [`TestCaseApp`].
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { TestCaseApp } from './pkg/testcase_wasm.js';
//!
//! await init();
//! const app = new TestCaseApp('http://localhost:5050');
//!
//! await app.analyzeDescription(textarea.value);
//! app.toggleScenario(0);
//! await app.generateSelected();
//! app.toggleTestCase(0, 1);
//! app.exportAccepted();
//! ```

pub mod api;
pub mod dom;
pub mod export;
pub mod history;

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use js_sys::Promise;
use navigator_core::{
    decode_state, handle_pop_state, ExportScope, NavigationError, PageController, RequestKind,
};
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{console, File, FormData, PopStateEvent};

use crate::api::{ApiClient, RequestBody};
use crate::dom::DomView;
use crate::history::BrowserHistory;

type Controller = PageController<BrowserHistory, DomView>;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console::log_1(&format!("testcase-wasm {} loaded", env!("CARGO_PKG_VERSION")).into());
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn js_error(e: NavigationError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// The running application: one per page load
#[wasm_bindgen]
pub struct TestCaseApp {
    controller: Rc<RefCell<Controller>>,
    api: ApiClient,
    on_pop_state: Closure<dyn FnMut(PopStateEvent)>,
}

#[wasm_bindgen]
impl TestCaseApp {
    /// Attach to the current document. `api_base` defaults to the page origin.
    ///
    /// The page the browser reloaded into is rebuilt from its history state.
    #[wasm_bindgen(constructor)]
    pub fn new(api_base: Option<String>) -> Result<TestCaseApp, JsValue> {
        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))?;
        let history = BrowserHistory::new()?;
        let initial = decode_state(history.current_raw().as_deref());
        let controller = Rc::new(RefCell::new(PageController::new(history, DomView::new()?)));

        let restored = handle_pop_state(&mut *controller.borrow_mut(), initial);
        restored.map_err(js_error)?;

        let on_pop_state = {
            let controller = Rc::clone(&controller);
            Closure::<dyn FnMut(PopStateEvent)>::new(move |event: PopStateEvent| {
                let state = decode_state(event.state().as_string().as_deref());
                let handled = handle_pop_state(&mut *controller.borrow_mut(), state);
                if let Err(e) = handled {
                    console::error_1(&format!("Failed to restore page: {}", e).into());
                }
            })
        };
        window.add_event_listener_with_callback("popstate", on_pop_state.as_ref().unchecked_ref())?;

        Ok(Self {
            controller,
            api: ApiClient::new(api_base.as_deref().unwrap_or_default()),
            on_pop_state,
        })
    }

    #[wasm_bindgen(js_name = analyzeDescription)]
    pub fn analyze_description(&self, description: &str) -> Result<Promise, JsValue> {
        let form = FormData::new()?;
        form.append_with_str("description", description)?;
        Ok(self.submit(RequestKind::Analyze, "/analyze", RequestBody::Form(form)))
    }

    #[wasm_bindgen(js_name = analyzeImage)]
    pub fn analyze_image(&self, file: File) -> Result<Promise, JsValue> {
        let form = FormData::new()?;
        form.append_with_blob_and_filename("image", &file, &file.name())?;
        Ok(self.submit(RequestKind::Analyze, "/analyze", RequestBody::Form(form)))
    }

    /// Upload a Swagger/OpenAPI or Postman JSON document
    #[wasm_bindgen(js_name = analyzeApiDocument)]
    pub fn analyze_api_document(&self, file: File) -> Result<Promise, JsValue> {
        let form = FormData::new()?;
        form.append_with_blob_and_filename("api_file", &file, &file.name())?;
        Ok(self.submit(
            RequestKind::Analyze,
            "/generate_api_tests",
            RequestBody::Form(form),
        ))
    }

    #[wasm_bindgen(js_name = analyzeWebsite)]
    pub fn analyze_website(&self, url: &str) -> Result<Promise, JsValue> {
        let body = json!({ "url": url.trim() }).to_string();
        Ok(self.submit(RequestKind::Analyze, "/analyze_website", RequestBody::Json(body)))
    }

    /// Returns whether the scenario is now selected
    #[wasm_bindgen(js_name = toggleScenario)]
    pub fn toggle_scenario(&self, index: usize) -> Result<bool, JsValue> {
        self.controller
            .borrow_mut()
            .toggle_scenario(index)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = selectAll)]
    pub fn select_all(&self, selected: bool) -> Result<(), JsValue> {
        self.controller
            .borrow_mut()
            .select_all(selected)
            .map_err(js_error)
    }

    /// Request detailed test cases for the selected scenarios.
    ///
    /// Resolves to `false` when nothing was sent or the request failed.
    #[wasm_bindgen(js_name = generateSelected)]
    pub fn generate_selected(&self) -> Result<Promise, JsValue> {
        let selection = {
            let controller = self.controller.borrow();
            let document_type = controller.session().analysis().map(|a| a.document_type);
            controller
                .selected_scenarios()
                .map(|scenarios| (scenarios, document_type))
        };

        let (scenarios, document_type) = match selection {
            Ok(selection) => selection,
            Err(refused) => {
                self.controller
                    .borrow_mut()
                    .report_error(&refused)
                    .map_err(js_error)?;
                return Ok(Promise::resolve(&JsValue::FALSE));
            }
        };

        let body = serde_json::to_string(&json!({
            "scenarios": scenarios,
            "document_type": document_type,
        }))
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;
        Ok(self.submit(RequestKind::Generate, "/generate", RequestBody::Json(body)))
    }

    /// Returns whether the test case is now accepted
    #[wasm_bindgen(js_name = toggleTestCase)]
    pub fn toggle_test_case(&self, scenario_index: usize, case_index: usize) -> Result<bool, JsValue> {
        self.controller
            .borrow_mut()
            .toggle_test_case(scenario_index, case_index)
            .map_err(js_error)
    }

    /// Download every test case. Returns whether a file was offered.
    #[wasm_bindgen(js_name = exportAll)]
    pub fn export_all(&self) -> Result<bool, JsValue> {
        self.export(ExportScope::All)
    }

    /// Download the accepted test cases only
    #[wasm_bindgen(js_name = exportAccepted)]
    pub fn export_accepted(&self) -> Result<bool, JsValue> {
        self.export(ExportScope::Accepted)
    }

    #[wasm_bindgen(js_name = newAnalysis)]
    pub fn new_analysis(&self) -> Result<(), JsValue> {
        self.controller.borrow_mut().new_analysis().map_err(js_error)
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.controller.borrow().is_busy()
    }

    #[wasm_bindgen(getter, js_name = currentPage)]
    pub fn current_page(&self) -> String {
        self.controller.borrow().visible_page().as_str().to_string()
    }

    /// Data behind the visible page, `null` on the input form
    #[wasm_bindgen(js_name = currentData)]
    pub fn current_data(&self) -> Result<JsValue, JsValue> {
        let controller = self.controller.borrow();
        match controller.displayed_data() {
            Some(data) => serde_wasm_bindgen::to_value(data)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(getter, js_name = selectedCount)]
    pub fn selected_count(&self) -> usize {
        self.controller.borrow().session().selections().len()
    }

    #[wasm_bindgen(getter, js_name = acceptedCount)]
    pub fn accepted_count(&self) -> usize {
        self.controller.borrow().session().accepted().len()
    }
}

impl TestCaseApp {
    fn export(&self, scope: ExportScope) -> Result<bool, JsValue> {
        let file = self
            .controller
            .borrow()
            .export(scope, Utc::now())
            .map_err(js_error)?;

        match file {
            Some(file) => {
                export::download(&file)?;
                Ok(true)
            }
            None => {
                self.controller
                    .borrow_mut()
                    .report_error(&NavigationError::NothingToExport)
                    .map_err(js_error)?;
                Ok(false)
            }
        }
    }

    /// Run one backend call. The controller is only borrowed between awaits.
    fn submit(&self, kind: RequestKind, path: &'static str, body: RequestBody) -> Promise {
        let controller = Rc::clone(&self.controller);
        let api = self.api.clone();

        future_to_promise(async move {
            let claimed = controller.borrow_mut().begin_request(kind);
            claimed.map_err(js_error)?;

            let outcome = api.post(path, body).await;

            let mut app = controller.borrow_mut();
            app.finish_request().map_err(js_error)?;
            match outcome {
                Ok(validated) => {
                    if !validated.is_clean() {
                        console::warn_1(
                            &format!(
                                "Dropped {} malformed items from the {} response",
                                validated.issues.len(),
                                kind
                            )
                            .into(),
                        );
                    }
                    match kind {
                        RequestKind::Analyze => app.analysis_completed(validated.value),
                        RequestKind::Generate => app.results_generated(validated.value),
                    }
                    .map_err(js_error)?;
                    Ok(JsValue::TRUE)
                }
                Err(failure) => {
                    console::warn_1(&format!("{} request failed: {}", kind, failure).into());
                    app.report_failure(&failure).map_err(js_error)?;
                    Ok(JsValue::FALSE)
                }
            }
        })
    }
}

impl Drop for TestCaseApp {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback(
                "popstate",
                self.on_pop_state.as_ref().unchecked_ref(),
            );
        }
    }
}
