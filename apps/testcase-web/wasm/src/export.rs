//! Offer an [`ExportFile`] as a browser download

use js_sys::Array;
use navigator_core::ExportFile;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Url};

pub fn download(file: &ExportFile) -> Result<(), JsValue> {
    let window =
        web_sys::window().ok_or_else(|| JsValue::from_str("No window object available"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("No document object available"))?;

    let options = BlobPropertyBag::new();
    options.set_type(ExportFile::MIME_TYPE);
    let parts = Array::of1(&JsValue::from_str(&file.contents));
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;

    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(&file.filename);
    anchor.click();

    Url::revoke_object_url(&url)
}
