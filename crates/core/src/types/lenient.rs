//! Lenient coercion of loosely typed form and API values.
//!
//! Prices and counts arrive from forms and the backend as numbers, numeric
//! strings, or garbage. Garbage becomes zero instead of an error.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON value into a decimal amount.
///
/// Numbers parse directly. Strings parse their leading numeric prefix, so
/// `"3.5kg"` is `3.5`. Anything else yields `0`.
#[must_use]
pub fn coerce_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else if let Some(u) = n.as_u64() {
                Decimal::from(u)
            } else {
                n.as_f64()
                    .and_then(Decimal::from_f64)
                    .unwrap_or(Decimal::ZERO)
            }
        }
        Value::String(s) => parse_decimal_prefix(s),
        _ => Decimal::ZERO,
    }
}

/// Coerce a JSON value into a non-negative count.
///
/// Fractions truncate toward zero. Negative, non-numeric and out-of-range
/// values yield `0`.
#[must_use]
pub fn coerce_count(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|u| u32::try_from(u).ok())
            .or_else(|| n.as_f64().and_then(truncate_to_u32))
            .unwrap_or(0),
        Value::String(s) => parse_count_prefix(s),
        _ => 0,
    }
}

/// Coerce a JSON value into a string, treating `null` as empty.
#[must_use]
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Serde helper: deserialize a count leniently.
///
/// # Errors
///
/// Only fails if the input is not valid JSON for the deserializer.
pub fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_count(&value))
}

/// Serde helper: deserialize an optional string leniently (numbers become text).
///
/// # Errors
///
/// Only fails if the input is not valid JSON for the deserializer.
pub fn deserialize_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_string(&value))
}

/// Parse the leading numeric part of a string, like a browser's `parseFloat`.
fn parse_decimal_prefix(s: &str) -> Decimal {
    let trimmed = s.trim();
    let end = numeric_prefix_len(trimmed, true);
    trimmed
        .get(..end)
        .and_then(|prefix| Decimal::from_str(prefix).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Parse the leading integer part of a string, like a browser's `parseInt`.
fn parse_count_prefix(s: &str) -> u32 {
    let trimmed = s.trim();
    let end = numeric_prefix_len(trimmed, false);
    trimmed
        .get(..end)
        .and_then(|prefix| prefix.parse::<u32>().ok())
        .unwrap_or(0)
}

fn numeric_prefix_len(s: &str, allow_fraction: bool) -> usize {
    let mut seen_dot = false;
    let mut len = 0;
    for (i, c) in s.char_indices() {
        let accepted = c.is_ascii_digit()
            || (i == 0 && (c == '-' || c == '+'))
            || (allow_fraction && c == '.' && !seen_dot);
        if !accepted {
            break;
        }
        if c == '.' {
            seen_dot = true;
        }
        len = i + c.len_utf8();
    }
    len
}

fn truncate_to_u32(f: f64) -> Option<u32> {
    if !f.is_finite() || f < 0.0 || f > f64::from(u32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // range checked above
    Some(f.trunc() as u32)
}
