//! Wire types shared by the transformers.
//!
//! Documents arrive as loosely typed JSON. Fields the transformers read are
//! typed here; everything else rides along in flattened maps so the view
//! model handed to templates is the original document plus annotations.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fields common to every page document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentHeader {
    /// Page kind discriminator.
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub title: String,
    /// Logged-in username, when the server knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// A single field mutation on a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Milliseconds since the Unix epoch.
    #[serde(deserialize_with = "millis")]
    pub time: i64,
    #[serde(default)]
    pub author: String,
    #[serde(
        default,
        deserialize_with = "opt_ticket_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub ticket: Option<u64>,
    pub field: String,
    #[serde(default)]
    pub oldvalue: Option<String>,
    #[serde(default)]
    pub newvalue: Option<String>,
}

/// Millisecond timestamp from any JSON number. Fractions are floored.
///
/// # Errors
///
/// Fails when the value is not a number or does not fit in `i64`.
pub fn millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_to_millis(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected millisecond timestamp, got {value}")))
}

/// Optional millisecond timestamp; `null` and `0` both mean "unset".
///
/// # Errors
///
/// Fails when a present value is not a number.
pub fn opt_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_to_millis(&value)
            .map(|ms| (ms != 0).then_some(ms))
            .ok_or_else(|| {
                serde::de::Error::custom(format!("expected millisecond timestamp, got {value}"))
            }),
    }
}

fn opt_ticket_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(ticket_id_of))
}

/// Interpret a JSON scalar as a millisecond timestamp.
#[must_use]
pub fn value_to_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(f64::floor)
                .and_then(float_to_i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_to_i64(f: f64) -> Option<i64> {
    // i64::MAX is not representable; compare against 2^63 exactly.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f >= -LIMIT && f < LIMIT).then(|| f as i64)
}

/// Interpret a JSON scalar (number or numeric string) as a ticket id.
#[must_use]
pub fn ticket_id_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Render a JSON scalar the way a template would interpolate it.
#[must_use]
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// JavaScript-style truthiness of a JSON value.
#[must_use]
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Untyped remainder of a document object.
pub type Extra = Map<String, Value>;
