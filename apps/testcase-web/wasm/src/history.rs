//! `window.history` backend
//!
//! Entries hold the JSON text of a [`NavigationState`], so the browser can
//! structured-clone them without help.

use navigator_core::{HistoryBackend, NavigationError, NavigationState};
use wasm_bindgen::JsValue;
use web_sys::History;

pub struct BrowserHistory {
    history: History,
}

impl BrowserHistory {
    pub fn new() -> Result<Self, JsValue> {
        let window =
            web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))?;
        Ok(Self {
            history: window.history()?,
        })
    }

    /// Raw state of the current entry, if it carries one
    pub fn current_raw(&self) -> Option<String> {
        self.history.state().ok().and_then(|state| state.as_string())
    }
}

fn encode(state: &NavigationState) -> Result<JsValue, NavigationError> {
    state.to_json().map(|json| JsValue::from_str(&json))
}

fn history_error(e: JsValue) -> NavigationError {
    NavigationError::History(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

impl HistoryBackend for BrowserHistory {
    fn push(&mut self, state: &NavigationState) -> Result<(), NavigationError> {
        self.history
            .push_state(&encode(state)?, "")
            .map_err(history_error)
    }

    fn replace(&mut self, state: &NavigationState) -> Result<(), NavigationError> {
        self.history
            .replace_state(&encode(state)?, "")
            .map_err(history_error)
    }
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use navigator_core::{decode_state, Page};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_replace_stores_json_state() {
        let mut history = BrowserHistory::new().unwrap();
        let state = NavigationState {
            page: Page::Input,
            data: None,
            selections: Vec::new(),
            accepted: vec!["TC001".to_string()],
        };

        history.replace(&state).unwrap();

        let restored = decode_state(history.current_raw().as_deref()).unwrap();
        assert_eq!(restored, state);
    }
}
