//! Value comparator
//!
//! Type-aware equality and formatting for heterogeneous configuration
//! values. Comparison never fails: mismatched, incomparable shapes fall back
//! to normalized text equality.
//!
//! # Rules
//!
//! - Numbers compare by magnitude regardless of representation (`5`, `5.0`,
//!   `"5"`, `"5e0"`)
//! - Durations compare in seconds, sizes in bytes
//! - Lists and comma-separated text compare as sets
//! - Booleans match `on`/`off`/`true`/`false` text
//! - Absent compares unequal to anything present, and equal to absent

use crate::value::{parse_bool, split_list, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Placeholder printed for absent values
pub const NOT_SET: &str = "<not set>";

/// Compare two optional values
#[must_use]
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => equal(a, b),
        _ => false,
    }
}

/// Compare two present values
#[must_use]
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Map(x), Value::Map(y)) => maps_equal(x, y),
        (Value::Duration(_), _) | (_, Value::Duration(_)) => {
            quantities_equal(a, b, duration_seconds)
        }
        (Value::Size(_), _) | (_, Value::Size(_)) => quantities_equal(a, b, size_bytes),
        (Value::List(_), _) | (_, Value::List(_)) => as_set(a) == as_set(b),
        (Value::Bool(x), other) | (other, Value::Bool(x)) => match as_bool(other) {
            Some(y) => *x == y,
            None => canonical_text(a) == canonical_text(b),
        },
        _ => scalars_equal(a, b),
    }
}

fn maps_equal(x: &BTreeMap<String, Value>, y: &BTreeMap<String, Value>) -> bool {
    x.len() == y.len()
        && x
            .iter()
            .all(|(key, value)| y.get(key).is_some_and(|other| equal(value, other)))
}

fn quantities_equal(a: &Value, b: &Value, magnitude: fn(&Value) -> Option<f64>) -> bool {
    match (magnitude(a), magnitude(b)) {
        (Some(x), Some(y)) => approx_eq(x, y),
        _ => canonical_text(a) == canonical_text(b),
    }
}

fn scalars_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (as_integer(a), as_integer(b)) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return approx_eq(x, y);
    }
    if let (Value::Str(x), Value::Str(y)) = (a, b) {
        if let (Some(x), Some(y)) = (parse_bool(x), parse_bool(y)) {
            return x == y;
        }
        if x.contains(',') || y.contains(',') {
            return as_set(a) == as_set(b);
        }
    }
    canonical_text(a) == canonical_text(b)
}

fn approx_eq(x: f64, y: f64) -> bool {
    (x - y).abs() <= f64::EPSILON * x.abs().max(y.abs()).max(1.0)
}

/// Numeric magnitude of a scalar, including numeric text
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        #[allow(clippy::cast_precision_loss)]
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Str(s) => parse_finite(s),
        _ => None,
    }
}

/// Exact integer; f64 loses precision above 2^53
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Int(0) => Some(false),
        Value::Int(1) => Some(true),
        Value::Str(s) => match s.trim() {
            "0" => Some(false),
            "1" => Some(true),
            other => parse_bool(other),
        },
        _ => None,
    }
}

fn as_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::List(items) => items.iter().map(canonical_text).collect(),
        Value::Str(s) => split_list(s).map(str::to_string).collect(),
        other => BTreeSet::from([canonical_text(other)]),
    }
}

/// Magnitude in seconds of a duration-like value
///
/// Accepts compound forms (`1h30m`, `500ms`, `1.5s`, `7d`). Bare numbers are
/// seconds.
#[must_use]
pub fn duration_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Duration(raw) | Value::Str(raw) => parse_duration(raw),
        other => as_number(other),
    }
}

fn parse_duration(text: &str) -> Option<f64> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    if let Some(seconds) = parse_finite(&text) {
        return Some(seconds);
    }

    let is_numeric = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = 0.0;
    let mut rest = text.as_str();
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !is_numeric(c)).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let amount: f64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];
        let unit_len = rest.find(is_numeric).unwrap_or(rest.len());
        let scale = match rest[..unit_len].trim() {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "" | "s" => 1.0,
            "m" => 60.0,
            "h" => 3_600.0,
            "d" => 86_400.0,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total += amount * scale;
    }
    Some(total)
}

/// Magnitude in bytes of a size-like value
///
/// Units are binary (`KB` and `KiB` both mean 1024). Bare numbers are bytes.
#[must_use]
pub fn size_bytes(value: &Value) -> Option<f64> {
    match value {
        Value::Size(raw) | Value::Str(raw) => parse_size(raw),
        other => as_number(other),
    }
}

fn parse_size(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Some(bytes) = parse_finite(text) {
        return Some(bytes);
    }
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    if split == 0 {
        return None;
    }
    let amount: f64 = text[..split].parse().ok()?;
    let exponent = match text[split..].trim().to_ascii_lowercase().as_str() {
        "b" => 0,
        "k" | "kb" | "kib" => 1,
        "m" | "mb" | "mib" => 2,
        "g" | "gb" | "gib" => 3,
        "t" | "tb" | "tib" => 4,
        "p" | "pb" | "pib" => 5,
        _ => return None,
    };
    Some(amount * 1024_f64.powi(exponent))
}

/// Normalized text used as the last-resort comparison key
fn canonical_text(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_number(*f),
        Value::Bool(b) => b.to_string(),
        Value::Str(s) | Value::Duration(s) | Value::Size(s) => s.trim().to_string(),
        Value::List(_) | Value::Map(_) => value.to_json().to_string(),
    }
}

/// Print a number without scientific notation
#[must_use]
pub fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.0}")
    } else {
        format!("{f}")
    }
}

/// Human-readable rendering of an optional value
///
/// Numeric text is normalized, other text is quoted, structured values are
/// pretty-printed JSON.
#[must_use]
pub fn format_value(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return NOT_SET.to_string();
    };
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_number(*f),
        Value::Bool(b) => b.to_string(),
        Value::Str(s) => match parse_finite(s) {
            Some(f) => format_number(f),
            None => format!("{s:?}"),
        },
        Value::Duration(s) | Value::Size(s) => s.clone(),
        Value::List(_) | Value::Map(_) => {
            serde_json::to_string_pretty(&value.to_json()).unwrap_or_default()
        }
    }
}

/// Render current/source/target side by side
///
/// Scalars go on one line, structured values on separate blocks.
#[must_use]
pub fn format_three_way(
    current: Option<&Value>,
    source: Option<&Value>,
    target: Option<&Value>,
) -> String {
    let structured = [current, source, target]
        .into_iter()
        .flatten()
        .any(Value::is_structured);
    if structured {
        format!(
            "Current Value:\n{}\n\nSource Default:\n{}\n\nTarget Default:\n{}",
            format_value(current),
            format_value(source),
            format_value(target)
        )
    } else {
        format!(
            "Current: {} | Source Default: {} | Target Default: {}",
            format_value(current),
            format_value(source),
            format_value(target)
        )
    }
}
