//! Binary codec.
//!
//! Boxes raw byte buffers as `{"_base64": "<standard base64>"}` so a
//! conversation survives generic JSON storage, and unboxes them again
//! before the history is handed back to a request builder.
//!
//! Unboxing keys on "an object whose only key is `_base64`". An unrelated
//! object with that exact shape is indistinguishable from boxed binary and
//! will be decoded too; callers must not use `_base64` as a sole key.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::value::{Map, Value};

/// Sole key of a boxed byte buffer.
pub const BASE64_KEY: &str = "_base64";

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Box a byte buffer: `{"_base64": "..."}`.
pub fn box_bytes(bytes: &[u8]) -> Value {
    let mut map = Map::new();
    map.insert(BASE64_KEY.to_string(), Value::String(encode_base64(bytes)));
    Value::Object(map)
}

/// Base64 payload of a boxed buffer, if `value` has the boxed shape.
pub fn boxed_payload(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get(BASE64_KEY).and_then(Value::as_str)
}

pub fn is_boxed_binary(value: &Value) -> bool {
    boxed_payload(value).is_some()
}

/// Live or boxed binary payload.
pub fn is_binary_payload(value: &Value) -> bool {
    value.is_bytes() || is_boxed_binary(value)
}

/// Decode a boxed buffer. Returns `None` for other shapes or invalid base64.
pub fn unbox_bytes(value: &Value) -> Option<Vec<u8>> {
    let payload = boxed_payload(value)?;
    match STANDARD.decode(payload) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::debug!("Leaving malformed boxed binary untouched: {}", e);
            None
        }
    }
}

/// Replace every raw byte buffer in the tree with its boxed form.
pub fn serialize_binary(tree: &Value) -> Value {
    match tree {
        Value::Bytes(bytes) => box_bytes(bytes),
        Value::Array(items) => Value::Array(items.iter().map(serialize_binary).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), serialize_binary(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Inverse of [`serialize_binary`]: every boxed buffer becomes raw bytes.
pub fn deserialize_binary(tree: &Value) -> Value {
    if let Some(bytes) = unbox_bytes(tree) {
        return Value::Bytes(bytes);
    }
    match tree {
        Value::Array(items) => Value::Array(items.iter().map(deserialize_binary).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), deserialize_binary(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// True if any raw byte buffer is reachable from `tree`.
pub fn contains_raw_bytes(tree: &Value) -> bool {
    match tree {
        Value::Bytes(_) => true,
        Value::Array(items) => items.iter().any(contains_raw_bytes),
        Value::Object(map) => map.values().any(contains_raw_bytes),
        _ => false,
    }
}
