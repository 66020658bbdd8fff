//! Attribute values, type converters and serializers
//!
//! Scalar attributes are read from XML as raw strings and turned into a
//! [`Value`] by a [`Converter`]; on the way back a [`Serializer`] renders the
//! value as text. Nested objects and object lists are values too, so an
//! [`Object`] can hold every schema-backed attribute in one map.

use crate::class::Object;
use crate::error::BoxError;
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{Number, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Function turning a raw XML string into a typed value
pub type Converter = Arc<dyn Fn(&str) -> std::result::Result<Value, BoxError> + Send + Sync>;

/// Function rendering a value as XML text
pub type Serializer = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Names of the built-in converters, see [`converter`]
pub const CONVERTER_NAMES: &[&str] = &["str", "int", "float", "bool", "decimal", "date", "datetime"];

/// Names of the built-in serializers, see [`serializer`]
pub const SERIALIZER_NAMES: &[&str] = &["str", "lower", "upper"];

/// A schema-backed attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text
    Str(String),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Exact decimal number
    Decimal(Decimal),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time with offset
    DateTime(DateTime<FixedOffset>),
    /// Nested object (single child)
    Object(Object),
    /// Ordered nested objects (repeated children)
    List(Vec<Object>),
}

impl Value {
    /// Name of the value's type, used in messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "str",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Decimal(_) => "decimal",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Object(_) => "object",
            Value::List(_) => "list",
        }
    }

    /// Compare with `other`, treating numbers of different kinds as equal
    /// when they have the same value (`Int(1)` matches `Float(1.0)`).
    ///
    /// Used to check converted values against configured options.
    pub fn matches(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => {
                *i as f64 == *f
            }
            (Value::Int(i), Value::Decimal(d)) | (Value::Decimal(d), Value::Int(i)) => {
                Decimal::from(*i) == *d
            }
            (Value::Float(f), Value::Decimal(d)) | (Value::Decimal(d), Value::Float(f)) => {
                Decimal::try_from(*f).is_ok_and(|f| f == *d)
            }
            _ => self == other,
        }
    }

    /// Get the text, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer, if this is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the float, if this is one
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get the boolean, if this is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the decimal, if this is one
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Get the nested object, if this is one
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the nested object mutably, if this is one
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the object list, if this is one
    pub fn as_list(&self) -> Option<&[Object]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Get the object list mutably, if this is one
    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Object>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Build a scalar value from JSON.
    ///
    /// Strings, booleans and numbers map onto `Str`, `Bool`, `Int` (when the
    /// number fits an `i64`) or `Float`. Other JSON values have no scalar
    /// counterpart and yield `None`.
    pub fn from_json(json: &JsonValue) -> Option<Value> {
        match json {
            JsonValue::String(s) => Some(Value::Str(s.clone())),
            JsonValue::Bool(b) => Some(Value::Bool(*b)),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Int(i)),
                None => n.as_f64().map(Value::Float),
            },
            _ => None,
        }
    }

    /// Convert to JSON for inspection
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Decimal(_) | Value::Date(_) | Value::DateTime(_) => {
                JsonValue::String(self.to_string())
            }
            Value::Object(o) => o.to_json(),
            Value::List(l) => JsonValue::Array(l.iter().map(Object::to_json).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Value::Object(o) => write!(f, "<{}>", o.class().tag()),
            Value::List(l) => write!(f, "[{} objects]", l.len()),
        }
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

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Vec<Object>> for Value {
    fn from(l: Vec<Object>) -> Self {
        Value::List(l)
    }
}

/// Error for text that is not a boolean literal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid boolean literal: '{0}'")]
pub struct ParseBoolError(pub String);

/// Wrap a fallible parse function as a [`Converter`]
pub fn converter_fn<T, E, F>(f: F) -> Converter
where
    F: Fn(&str) -> std::result::Result<T, E> + Send + Sync + 'static,
    T: Into<Value>,
    E: Into<BoxError>,
{
    Arc::new(move |raw| f(raw).map(Into::into).map_err(Into::into))
}

/// Wrap a rendering function as a [`Serializer`]
pub fn serializer_fn<F>(f: F) -> Serializer
where
    F: Fn(&Value) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Converter keeping the raw text unchanged
pub fn string_converter() -> Converter {
    Arc::new(|raw| Ok(Value::Str(raw.to_string())))
}

fn parse_bool(raw: &str) -> std::result::Result<bool, ParseBoolError> {
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ParseBoolError(other.to_string())),
    }
}

/// Look up a built-in converter by name
pub fn converter(name: &str) -> Option<Converter> {
    let conv = match name {
        "str" => string_converter(),
        "int" => converter_fn(|raw| raw.trim().parse::<i64>()),
        "float" => converter_fn(|raw| raw.trim().parse::<f64>()),
        "bool" => converter_fn(parse_bool),
        "decimal" => converter_fn(|raw| Decimal::from_str(raw.trim())),
        "date" => converter_fn(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")),
        "datetime" => converter_fn(|raw| DateTime::parse_from_rfc3339(raw.trim())),
        _ => return None,
    };
    Some(conv)
}

/// Generic stringification via `Display`
pub fn default_serializer() -> Serializer {
    Arc::new(|value| value.to_string())
}

/// Look up a built-in serializer by name
pub fn serializer(name: &str) -> Option<Serializer> {
    let ser = match name {
        "str" => default_serializer(),
        "lower" => serializer_fn(|value| value.to_string().to_lowercase()),
        "upper" => serializer_fn(|value| value.to_string().to_uppercase()),
        _ => return None,
    };
    Some(ser)
}
