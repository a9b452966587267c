//! Loose value coercion
//!
//! Patches are produced by a model service and by browser clients, so
//! numbers arrive as strings, flags as booleans, and so on. These helpers
//! give every such value one well-defined reading, matching how the
//! platform's clients interpret them (`Number(x)` / `String(x)`).

use serde_json::Value;

/// Numeric reading of an arbitrary JSON value
///
/// - `null` → 0, `false`/`true` → 0/1
/// - strings: trimmed, empty → 0, otherwise decimal or exponent notation,
///   `Infinity` with optional sign; anything else is NaN
/// - arrays read as their [`to_text`] form
/// - objects are NaN
#[must_use]
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_numeric(s),
        Value::Array(_) => parse_numeric(&to_text(value)),
        Value::Object(_) => f64::NAN,
    }
}

fn parse_numeric(raw: &str) -> f64 {
    let s = raw.trim();
    match s {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if s
            .chars()
            .any(|c| c.is_alphabetic() && c != 'e' && c != 'E') =>
        {
            f64::NAN
        }
        _ => s.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Textual reading of an arbitrary JSON value
///
/// Strings pass through, integral numbers print without a fraction, arrays
/// join their elements with `,` (nulls render empty), objects render as
/// `[object Object]`.
#[must_use]
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn number_text(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// `value` is present: neither missing nor JSON `null`
#[inline]
#[must_use]
pub fn is_present(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

/// Integer reading: NaN becomes 0, fractions truncate toward zero
#[must_use]
pub fn to_integer(value: &Value) -> i64 {
    let n = to_number(value);
    if n.is_nan() {
        0
    } else {
        // saturating cast
        n.trunc() as i64
    }
}

/// 0/1 flag reading: any non-zero number is 1
#[must_use]
pub fn to_flag(value: &Value) -> u8 {
    let n = to_number(value);
    u8::from(!n.is_nan() && n != 0.0)
}

/// Percentage reading: NaN becomes 0, rounded, clamped to `0..=100`
#[must_use]
pub fn to_percent(value: &Value) -> u8 {
    let n = to_number(value);
    if n.is_nan() {
        return 0;
    }
    // clamp first so the cast is exact
    n.round().clamp(0.0, 100.0) as u8
}

/// Lenient `Deserialize` adapters for stored documents
///
/// Older documents were written without validation; these accept anything
/// the coercions above understand instead of failing the whole load.
pub mod de {
    use super::{to_flag, to_integer, to_number, to_percent, to_text};
    use crate::model::HistoryEntry;
    use crate::skill::SkillLevel;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    /// Integer from number, numeric string, bool or null
    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(to_integer(&Value::deserialize(d)?))
    }

    /// Non-negative module index
    pub fn module<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let n = to_integer(&Value::deserialize(d)?);
        Ok(u32::try_from(n.max(0)).unwrap_or(u32::MAX))
    }

    /// 0/1 flag from number or bool
    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        Ok(to_flag(&Value::deserialize(d)?))
    }

    /// Course → percent map, values clamped
    pub fn percent_map<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, u8>, D::Error> {
        Ok(entries(Value::deserialize(d)?)
            .map(|(k, v)| (k, to_percent(&v)))
            .collect())
    }

    /// Skill map; entries with unrecognized levels are dropped
    pub fn skill_map<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, SkillLevel>, D::Error> {
        Ok(entries(Value::deserialize(d)?)
            .filter_map(|(skill, level)| {
                let parsed = level.as_str().and_then(SkillLevel::parse_loose);
                if parsed.is_none() {
                    tracing::warn!("Dropping stored skill '{}' with level {}", skill, level);
                }
                parsed.map(|l| (skill, l))
            })
            .collect())
    }

    /// Course → score map; entries that are not finite numbers are dropped
    pub fn score_map<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, f64>, D::Error> {
        Ok(entries(Value::deserialize(d)?)
            .filter_map(|(key, value)| {
                let n = to_number(&value);
                if !n.is_finite() {
                    tracing::warn!("Dropping stored score '{}': {}", key, value);
                }
                n.is_finite().then_some((key, n))
            })
            .collect())
    }

    /// String, with `null` read as empty and other scalars rendered as text
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => String::new(),
            other => to_text(&other),
        })
    }

    /// List of strings; elements are rendered as text and nulls dropped
    pub fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let Value::Array(items) = Value::deserialize(d)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .iter()
            .filter(|item| !item.is_null())
            .map(to_text)
            .collect())
    }

    /// History list; elements that are not objects are dropped
    pub fn history<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<HistoryEntry>, D::Error> {
        let Value::Array(items) = Value::deserialize(d)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| {
                if !item.is_object() {
                    tracing::warn!("Dropping stored history entry {}", item);
                    return None;
                }
                HistoryEntry::deserialize(item).ok()
            })
            .collect())
    }

    /// Key/value pairs of an object; anything else has none
    fn entries(value: Value) -> impl Iterator<Item = (String, Value)> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
        .into_iter()
        .flatten()
    }

    /// Optional string; numbers and bools are rendered as text
    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            other => Some(super::to_text(&other)),
        })
    }

    /// Epoch milliseconds from number or numeric string
    pub fn epoch_ms<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        integer(d)
    }
}
