// crates/wire-format/src/json.rs
//! Field accessors over `serde_json` objects
//!
//! Historical bookmark formats were written by several clients, so numbers
//! sometimes arrive as strings and optional fields are often absent. These
//! helpers centralise that leniency.

use crate::error::{WireError, WireResult};
use chrono::{DateTime, Utc};
use pagemark_core::parse_time;
use serde_json::{Map, Value};
use url::Url;

pub(crate) type Object = Map<String, Value>;

pub(crate) fn as_object<'a>(value: &'a Value, what: &str) -> WireResult<&'a Object> {
    value
        .as_object()
        .ok_or_else(|| WireError::NotAnObject(what.to_string()))
}

pub(crate) fn object<'a>(node: &'a Object, field: &str) -> WireResult<&'a Object> {
    match node.get(field) {
        Some(value) => as_object(value, field),
        None => Err(WireError::MissingField(field.to_string())),
    }
}

/// Text form of a scalar: strings as-is, numbers rendered
pub(crate) fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn opt_string(node: &Object, field: &str) -> Option<String> {
    match node.get(field) {
        None | Some(Value::Null) => None,
        Some(value) => text_of(value),
    }
}

pub(crate) fn string(node: &Object, field: &str) -> WireResult<String> {
    opt_string(node, field).ok_or_else(|| WireError::MissingField(field.to_string()))
}

pub(crate) fn string_or(node: &Object, field: &str, default: &str) -> String {
    opt_string(node, field).unwrap_or_else(|| default.to_string())
}

pub(crate) fn opt_f64(node: &Object, field: &str) -> WireResult<Option<f64>> {
    match node.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| WireError::invalid(field, "not a finite number")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| WireError::invalid(field, e.to_string())),
        Some(other) => Err(WireError::invalid(field, format!("expected a number, got {}", other))),
    }
}

pub(crate) fn f64_or(node: &Object, field: &str, default: f64) -> WireResult<f64> {
    Ok(opt_f64(node, field)?.unwrap_or(default))
}

pub(crate) fn f64_required(node: &Object, field: &str) -> WireResult<f64> {
    opt_f64(node, field)?.ok_or_else(|| WireError::MissingField(field.to_string()))
}

pub(crate) fn opt_i64(node: &Object, field: &str) -> WireResult<Option<i64>> {
    match node.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(v) => Ok(Some(v)),
            // Some players wrote integral offsets as doubles
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0)
                .map(|f| Some(f as i64))
                .ok_or_else(|| WireError::invalid(field, "not an integer")),
        },
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| WireError::invalid(field, e.to_string())),
        Some(other) => Err(WireError::invalid(field, format!("expected an integer, got {}", other))),
    }
}

pub(crate) fn i64_or(node: &Object, field: &str, default: i64) -> WireResult<i64> {
    Ok(opt_i64(node, field)?.unwrap_or(default))
}

pub(crate) fn i64_required(node: &Object, field: &str) -> WireResult<i64> {
    opt_i64(node, field)?.ok_or_else(|| WireError::MissingField(field.to_string()))
}

pub(crate) fn time(node: &Object, field: &str) -> WireResult<DateTime<Utc>> {
    let text = string(node, field)?;
    Ok(parse_time(&text)?)
}

pub(crate) fn opt_uri(node: &Object, field: &str) -> WireResult<Option<Url>> {
    match opt_string(node, field) {
        None => Ok(None),
        Some(text) if text.is_empty() => Ok(None),
        Some(text) => Url::parse(&text)
            .map(Some)
            .map_err(|e| WireError::invalid(field, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_numbers_as_strings() {
        let node = obj(json!({"a": "12", "b": "0.25"}));
        assert_eq!(opt_i64(&node, "a").unwrap(), Some(12));
        assert_eq!(opt_f64(&node, "b").unwrap(), Some(0.25));
    }

    #[test]
    fn test_integral_double_accepted() {
        let node = obj(json!({"t": 1500.0}));
        assert_eq!(i64_required(&node, "t").unwrap(), 1500);
    }

    #[test]
    fn test_defaults_for_absent_and_null() {
        let node = obj(json!({"n": null}));
        assert_eq!(string_or(&node, "n", "null"), "null");
        assert_eq!(f64_or(&node, "missing", 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_missing_required() {
        let node = obj(json!({}));
        assert!(matches!(string(&node, "opdsId"), Err(WireError::MissingField(_))));
    }

    #[test]
    fn test_empty_uri_is_absent() {
        let node = obj(json!({"uri": ""}));
        assert_eq!(opt_uri(&node, "uri").unwrap(), None);
    }
}
