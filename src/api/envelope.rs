//! Tolerant decoding of backend responses.
//!
//! The backend mixes PascalCase and camelCase field names, and list
//! endpoints sometimes return a bare array instead of the paging envelope.
//! Everything is normalized here, once, before typed deserialization.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ApiError, ApiResult};

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new", alias = "items")]
    pub data: Vec<T>,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u64,
}

impl<T> Page<T> {
    /// Wrap a bare list as a single page.
    pub fn single(data: Vec<T>) -> Self {
        let n = data.len();
        Self {
            data,
            current_page: 1,
            page_size: n as u32,
            total_pages: 1,
            total_count: n as u64,
        }
    }
}

/// Normalize a key to camelCase: `ContactNumber` -> `contactNumber`,
/// `ID` -> `id`. Acronym runs collapse to one word, so `ContentSID` and
/// `IDNumber` become `contentSid` and `idNumber`.
fn camel_key(key: &str) -> String {
    if key.len() > 1 && key.chars().all(|c| !c.is_lowercase()) {
        return key.to_lowercase();
    }
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len());
    for (i, &c) in chars.iter().enumerate() {
        let prev_upper = i > 0 && chars[i - 1].is_uppercase();
        let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
        // The last capital of a run starts the next word.
        if c.is_uppercase() && (i == 0 || (prev_upper && !next_lower)) {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Recursively normalize object keys to camelCase.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(camel_key(&k), normalize_keys(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

/// Normalize and deserialize a single record.
pub fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(normalize_keys(value)).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Normalize and deserialize a page, accepting a bare array as one page.
pub fn decode_page<T: DeserializeOwned>(value: Value) -> ApiResult<Page<T>> {
    match normalize_keys(value) {
        Value::Array(items) => {
            let data = serde_json::from_value(Value::Array(items))?;
            Ok(Page::single(data))
        }
        obj => serde_json::from_value(obj).map_err(|e| ApiError::Decode(e.to_string())),
    }
}

/// Normalize and deserialize a list, accepting either a bare array or an
/// envelope with `data`/`items`.
pub fn decode_list<T: DeserializeOwned>(value: Value) -> ApiResult<Vec<T>> {
    Ok(decode_page(value)?.data)
}

/// Decode a record from a response that may legitimately be empty.
///
/// Mutation endpoints return the saved record on some backend versions
/// and nothing (or a status message) on others.
pub fn decode_opt<T: DeserializeOwned>(value: Value) -> Option<T> {
    match value {
        Value::Null | Value::String(_) => None,
        other => match decode(other) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!("Ignoring undecodable response body: {}", e);
                None
            }
        },
    }
}

/// Extract a human-readable message from an error body, if the server sent one.
pub fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let value = normalize_keys(value);
    ["message", "error", "title", "detail"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(String::from)
}
