//! Typed cell values and the per-row working record

use std::collections::HashMap;

use chrono::NaiveDate;

/// A coerced value held by a working record field
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null/empty value
    Null,
    /// Text value
    Text(String),
    /// Floating point measurement
    Number(f64),
    /// Whole number (identifiers, the delete marker)
    Int(i64),
    /// Calendar date
    Date(NaiveDate),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as a float
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to JSON for submission payloads
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Number(f) => serde_json::json!(*f),
            Value::Int(i) => serde_json::json!(*i),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "(null)"),
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Int(i) => write!(f, "{}", i),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

/// Mutable mapping from target field name to coerced value, built up by the
/// pipeline stages for a single spreadsheet row. Lives only for the duration
/// of that row's processing.
#[derive(Debug, Clone, Default)]
pub struct WorkingRecord {
    fields: HashMap<String, Value>,
}

impl WorkingRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Set a field only when the value is a finite number; non-finite inputs
    /// are dropped so a failed calculation leaves the field unset.
    pub fn set_finite(&mut self, field: &str, value: f64) {
        if value.is_finite() {
            self.set(field, Value::Number(value));
        } else {
            log::warn!("dropping non-finite value for field '{}'", field);
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_text)
    }

    /// Numeric field value, 0.0 when the field is unset. Matches the
    /// pipeline's coercion rule: missing measurements read as zero.
    pub fn number_or_zero(&self, field: &str) -> f64 {
        self.get(field).and_then(Value::as_number).unwrap_or(0.0)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}
