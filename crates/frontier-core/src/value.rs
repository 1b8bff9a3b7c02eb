//! Dynamic value types for persistence records

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamic value that can represent any persisted field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    /// No value / null
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (for counts, timestamps, etc.)
    Int(i64),
    /// Floating point value (for sizes, costs, balances)
    Float(f64),
    /// String value
    String(String),
    /// Map of string keys to values (for nested tables like item prices)
    Map(ValueMap),
}

/// A map of string keys to dynamic values
///
/// Uses IndexMap to preserve insertion order (useful for deterministic serialization)
pub type ValueMap = IndexMap<String, Value>;

/// The flat field-to-value shape every persistence-gateway key stores
///
/// Compatible with a human-editable structured text dump: every field is a
/// named scalar or a one-level map.
pub type Record = ValueMap;

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a map
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Map(_) => "map",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

/// Read a float field from a record, falling back to a default
pub fn record_float(record: &Record, key: &str, default: f64) -> f64 {
    record.get(key).and_then(|v| v.as_float()).unwrap_or(default)
}

/// Read an integer field from a record, falling back to a default
pub fn record_int(record: &Record, key: &str, default: i64) -> i64 {
    record.get(key).and_then(|v| v.as_int()).unwrap_or(default)
}

/// Read a boolean field from a record, falling back to a default
pub fn record_bool(record: &Record, key: &str, default: bool) -> bool {
    record.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

/// Read a string field from a record, falling back to a default
pub fn record_str<'a>(record: &'a Record, key: &str, default: &'a str) -> &'a str {
    record.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}
