//! Shared helpers for the WASM API
//!
//! Serialization in both directions and error conversion, with failures
//! logged before they cross into JavaScript.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

/// Deserialize a value from JavaScript
///
/// `undefined` and `null` become `T::default()`.
pub fn deserialize_or_default<T: DeserializeOwned + Default>(
    value: JsValue,
    error_context: &str,
) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error(format!("{}: {}", error_context, e)))
}

/// Serialize a value to JavaScript
pub fn serialize<T: Serialize>(value: &T, error_context: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| js_error(format!("{}: {}", error_context, e)))
}

/// Log an error and convert it for JavaScript
pub fn js_error(err: impl Display) -> JsValue {
    let msg = err.to_string();
    log::error!("{}", msg);
    JsValue::from_str(&msg)
}
