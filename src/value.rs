//! Value model for view-models, element properties and expression results.
//!
//! Rust has no dynamic objects, so the view-model is an explicit value tree.
//! `Object` fields keep insertion order (IndexMap) so scans and snapshots are
//! deterministic. `List` exists only as an expression result (the `repeat`
//! directive) and as the shape the structural validator rejects inside a
//! view-model.

use indexmap::IndexMap;
use std::fmt;

/// A dynamically typed value.
///
/// Equality is strict (`PartialEq`): no cross-type coercion, and
/// `Number(f64::NAN) != Number(f64::NAN)`, so a NaN write through the
/// reactive store always looks like a change.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// True if the value contains a `List` at any depth.
    pub fn contains_list(&self) -> bool {
        match self {
            Value::List(_) => true,
            Value::Object(fields) => fields.values().any(Value::contains_list),
            _ => false,
        }
    }

    /// Truthiness used by `!`, `&&` and `||`.
    ///
    /// Empty strings, zero and NaN are falsy; objects and lists are always
    /// truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(_) | Value::Object(_) => true,
        }
    }

    /// Text coercion used when a value lands in a text-carrying element
    /// property. `Null` becomes the empty string (the safe UI fallback).
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::as_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object]".to_string(),
        }
    }

    /// Numeric view, if this value is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Object view, if this value is an object.
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Empty object, the usual starting point for a view-model.
    pub fn object() -> Value {
        Value::Object(IndexMap::new())
    }
}

/// Format a number the way a text property expects: integral values drop the
/// decimal point.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<const N: usize> From<[(&str, Value); N]> for Value {
    fn from(fields: [(&str, Value); N]) -> Self {
        Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}
