//! Column mapping: binding target fields to source columns and coercing
//! raw cell values into a working record

use std::collections::HashMap;

use anyhow::{bail, Result};
use chrono::NaiveDate;

use super::fields::{DatasetKind, ValueType};
use super::value::{Value, WorkingRecord};
use super::RawRecord;

/// Mapping from target field name to source column name. One instance per
/// active dataset tab; reset whenever a new batch is loaded.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    bindings: HashMap<String, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a target field to a source column, replacing any previous binding
    pub fn bind(&mut self, field: impl Into<String>, column: impl Into<String>) {
        self.bindings.insert(field.into(), column.into());
    }

    /// Remove a binding, returning the field to "unset"
    pub fn unbind(&mut self, field: &str) {
        self.bindings.remove(field);
    }

    /// The source column bound to a target field, if any
    pub fn binding(&self, field: &str) -> Option<&str> {
        self.bindings.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Batch precondition: every required field of the dataset must have a
    /// bound column, and every bound target must exist in the registry.
    /// Reported once, before any row is processed.
    pub fn validate(&self, dataset: DatasetKind) -> Result<()> {
        let unknown: Vec<&str> = self
            .bindings
            .keys()
            .filter(|name| dataset.field(name).is_none())
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            bail!(
                "unknown target field(s) for the {} dataset: {}",
                dataset,
                unknown.join(", ")
            );
        }

        let missing: Vec<&str> = dataset
            .required_fields()
            .filter(|f| !self.bindings.contains_key(f.name))
            .map(|f| f.name)
            .collect();
        if !missing.is_empty() {
            bail!(
                "required field(s) without a bound column: {}",
                missing.join(", ")
            );
        }

        Ok(())
    }

    /// Warn about bindings that point at columns the loaded sheet does not
    /// have; those fields will coerce as empty cells.
    pub fn check_columns(&self, columns: &[String]) {
        for (field, column) in &self.bindings {
            if !columns.iter().any(|c| c == column) {
                log::warn!(
                    "field '{}' is bound to column '{}' which is not in the sheet",
                    field,
                    column
                );
            }
        }
    }

    /// Build a working record for one raw row. Numeric cells that fail to
    /// parse coerce to 0.0 (never NaN); date fields without an explicit
    /// value take the run's reference date.
    pub fn resolve_row(
        &self,
        row: &RawRecord,
        dataset: DatasetKind,
        reference_date: NaiveDate,
    ) -> WorkingRecord {
        let mut record = WorkingRecord::new();

        for field in dataset.mappable_fields() {
            let Some(column) = self.binding(field.name) else {
                continue;
            };
            let raw = row.get(column);

            match field.value_type {
                ValueType::Number => {
                    record.set(field.name, Value::Number(coerce_number(raw)));
                }
                ValueType::Text => {
                    if let Some(text) = coerce_text(raw) {
                        record.set(field.name, Value::Text(text));
                    }
                }
                ValueType::Date => match coerce_text(raw) {
                    Some(text) => record.set(field.name, Value::Text(text)),
                    None => record.set(field.name, Value::Date(reference_date)),
                },
            }
        }

        record
    }
}

fn coerce_number(raw: Option<&serde_json::Value>) -> f64 {
    let parsed = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(serde_json::Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        Some(_) => {
            log::warn!("non-finite numeric cell, substituting 0");
            0.0
        }
        None => 0.0,
    }
}

fn coerce_text(raw: Option<&serde_json::Value>) -> Option<String> {
    match raw {
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}
