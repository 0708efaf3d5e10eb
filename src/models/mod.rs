//! Data models for backend entities
//!
//! Every type here expects camelCase keys; responses pass through
//! `api::envelope::normalize_keys` first.

mod campaign;
mod chatbot;
mod contact;
mod conversation;
mod template;
mod user;

pub use campaign::*;
pub use chatbot::*;
pub use contact::*;
pub use conversation::*;
pub use template::*;
pub use user::*;

/// Serde helpers for fields the backend sends with varying JSON types.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept a string or a number, yielding a string.
    pub fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number, got {}",
                other
            ))),
        }
    }

    /// Optional variant of [`string_or_number`]; null and empty map to `None`.
    pub fn opt_string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = string_or_number(d)?;
        Ok(if s.is_empty() { None } else { Some(s) })
    }

    /// Treat `null` as the type's default.
    pub fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Default + Deserialize<'de>,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }
}

/// Render an RFC 3339 / ISO-8601 timestamp as `YYYY-MM-DD HH:MM`.
///
/// Naive timestamps (no offset) are taken as UTC. Unparseable input is
/// returned unchanged.
pub fn short_time(ts: &str) -> String {
    use chrono::{DateTime, NaiveDateTime};

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }
    ts.to_string()
}
