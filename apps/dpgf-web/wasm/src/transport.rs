//! `fetch`-backed transport for the DPGF client

use std::time::Duration;

use dpgf_core::endpoint::{ApiRequest, ApiResponse, Body};
use dpgf_core::{DpgfError, Result, Transport};
use js_sys::{Array, Promise, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, FormData, Request, RequestInit, RequestMode, Response};

use crate::console;

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl FetchTransport {
    pub fn new() -> Self {
        Self
    }

    async fn send_js(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, JsValue> {
        let window = web_sys::window().ok_or("No window")?;

        let opts = RequestInit::new();
        opts.set_method(request.method.as_str());
        opts.set_mode(RequestMode::Cors);

        let mut content_type = None;
        match &request.body {
            Body::Empty => {}
            Body::Json(value) => {
                let body_str =
                    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))?;
                opts.set_body(&JsValue::from_str(&body_str));
                content_type = Some("application/json");
            }
            Body::Multipart {
                field,
                file_name,
                bytes,
            } => {
                // the browser sets the multipart boundary header itself
                let form = FormData::new()?;
                form.append_with_blob_and_filename(field, &bytes_to_blob(bytes)?, file_name)?;
                opts.set_body(&form);
            }
        }

        let js_request = Request::new_with_str_and_init(&request.url, &opts)?;
        js_request.headers().set("Accept", "application/json")?;
        if let Some(content_type) = content_type {
            js_request.headers().set("Content-Type", content_type)?;
        }

        let response = JsFuture::from(window.fetch_with_request(&js_request)).await?;
        let response: Response = response.dyn_into()?;
        let text = JsFuture::from(response.text()?).await?;

        Ok(ApiResponse {
            status: response.status(),
            body: text.as_string().unwrap_or_default(),
        })
    }
}

impl Transport for FetchTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.send_js(request).await.map_err(|e| {
            let error = DpgfError::Transport(js_error_message(&e));
            console::error(&format!("{} {}: {}", request.method.as_str(), request.url, error));
            error
        })
    }

    async fn delay(&self, duration: Duration) {
        let _ = JsFuture::from(sleep(duration)).await;
    }
}

/// A promise resolving after `duration`
pub fn sleep(duration: Duration) -> Promise {
    let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
    Promise::new(&mut |resolve, _reject| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
        }
    })
}

fn bytes_to_blob(bytes: &[u8]) -> std::result::Result<Blob, JsValue> {
    let array = Uint8Array::from(bytes);
    let parts = Array::new();
    parts.push(&array.buffer());
    Blob::new_with_u8_array_sequence(&parts)
}

/// Best-effort text of a JS exception (`TypeError: Failed to fetch`, ...)
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
