//! Forgiving field readers for documents written by older versions.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    value.as_str()?.trim().parse().ok()
}

/// Unparseable or empty timestamps read as the default.
pub(crate) fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(parse_timestamp(&value).unwrap_or_default())
}

pub(crate) fn optional_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(parse_timestamp(&value))
}

/// 0/1 flags that may have been written as booleans or strings.
pub(crate) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => u8::from(b),
        Value::Number(n) => u8::from(n.as_f64().is_some_and(|n| n != 0.0)),
        Value::String(s) => u8::from(matches!(s.trim(), "1" | "true" | "True")),
        _ => 0,
    })
}
