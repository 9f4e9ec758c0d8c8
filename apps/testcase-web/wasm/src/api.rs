//! Backend calls through `fetch`
//!
//! Every call is cancelled by an `AbortController` after
//! [`REQUEST_TIMEOUT_MS`]; the abort surfaces as [`AnalysisFailure::Timeout`].

use navigator_core::{classify_response, AnalysisFailure, REQUEST_TIMEOUT_MS};
use testcase_types::{AnalysisResult, Validated};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, DomException, FormData, Request, RequestInit, RequestMode, Response};

/// Body of a POST to the backend
pub enum RequestBody {
    Form(FormData),
    Json(String),
}

/// Where the backend lives. Empty means same origin.
#[derive(Debug, Clone, Default)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST `body` to `path` and validate the answer
    pub async fn post(
        &self,
        path: &str,
        body: RequestBody,
    ) -> Result<Validated<AnalysisResult>, AnalysisFailure> {
        let window = web_sys::window()
            .ok_or_else(|| AnalysisFailure::Network("No window object available".to_string()))?;
        let abort = AbortController::new().map_err(failure)?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        opts.set_signal(Some(&abort.signal()));
        let is_json = matches!(body, RequestBody::Json(_));
        match &body {
            RequestBody::Form(form) => opts.set_body(form),
            RequestBody::Json(json) => opts.set_body(&JsValue::from_str(json)),
        }

        let request = Request::new_with_str_and_init(&self.url(path), &opts).map_err(failure)?;
        if is_json {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(failure)?;
        }

        let on_timeout = {
            let abort = abort.clone();
            Closure::once(move || abort.abort())
        };
        let timer = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                on_timeout.as_ref().unchecked_ref(),
                REQUEST_TIMEOUT_MS as i32,
            )
            .map_err(failure)?;

        let outcome = read_response(&window, &request).await;
        window.clear_timeout_with_handle(timer);
        drop(on_timeout);

        let (status, text) = outcome.map_err(failure)?;
        classify_response(status, &text)
    }
}

async fn read_response(window: &web_sys::Window, request: &Request) -> Result<(u16, String), JsValue> {
    let response: Response = JsFuture::from(window.fetch_with_request(request))
        .await?
        .dyn_into()?;
    let text = JsFuture::from(response.text()?).await?;
    Ok((response.status(), text.as_string().unwrap_or_default()))
}

/// Map a rejected browser promise to a failure
fn failure(e: JsValue) -> AnalysisFailure {
    if let Some(exception) = e.dyn_ref::<DomException>() {
        if exception.name() == "AbortError" {
            return AnalysisFailure::Timeout;
        }
        return AnalysisFailure::Network(exception.message());
    }
    if let Some(error) = e.dyn_ref::<js_sys::Error>() {
        return AnalysisFailure::Network(String::from(error.message()));
    }
    AnalysisFailure::Network(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}
