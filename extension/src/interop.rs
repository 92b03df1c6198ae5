// JsValue <-> Rust conversions

use hw_relay_core::{Payload, RelayError};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Opaque relayed message, passed through without conversion
#[derive(Debug, Clone)]
pub struct JsPayload(pub JsValue);

impl Payload for JsPayload {
    fn is_empty(&self) -> bool {
        self.0.is_falsy()
    }
}

pub fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, RelayError> {
    let json = serde_json::to_string(value)
        .map_err(|e| RelayError::PageBus(format!("Serialization error: {}", e)))?;
    js_sys::JSON::parse(&json).map_err(|e| RelayError::PageBus(describe(&e)))
}

pub fn into_js_error(err: RelayError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
