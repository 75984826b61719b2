//! Spreadsheet source
//!
//! Loads the first worksheet of an .xlsx file into an ordered batch of raw
//! records plus the column names taken from the header row. Everything past
//! this point works on untyped cells; coercion happens in the mapping
//! resolver.

use anyhow::{bail, Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use serde_json::{json, Value};
use std::path::Path;

use crate::import::RawRecord;

/// One fully-loaded spreadsheet batch
#[derive(Debug, Clone)]
pub struct SheetData {
    /// Column names from the header row, in sheet order
    pub columns: Vec<String>,
    /// One raw record per data row, in sheet order
    pub rows: Vec<RawRecord>,
}

/// Convert a cell to an untyped JSON value
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => json!(*i),
        Data::Float(f) => json!(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => Value::String(format!("{}", dt)),
        Data::DateTimeIso(s) => Value::String(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::Null,
    }
}

/// Load the first worksheet of an Excel file.
pub fn load_sheet<P: AsRef<Path>>(path: P) -> Result<SheetData> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("failed to open spreadsheet: {}", path.display()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("the workbook has no sheets")?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {}", sheet_name))?;

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        bail!("the spreadsheet is empty");
    };

    let columns: Vec<String> = header_row
        .iter()
        .map(|c| match c {
            Data::String(s) => s.trim().to_string(),
            other => cell_to_value(other).as_str().map(str::to_string).unwrap_or_default(),
        })
        .collect();

    let mut rows = Vec::new();
    for row in rows_iter {
        let mut record = RawRecord::new();
        for (idx, cell) in row.iter().enumerate() {
            let Some(column) = columns.get(idx) else { continue };
            if column.is_empty() {
                continue;
            }
            let value = cell_to_value(cell);
            if value.is_null() {
                continue;
            }
            record.insert(column.clone(), value);
        }
        if !record.is_empty() {
            rows.push(record);
        }
    }

    if rows.is_empty() {
        bail!("the spreadsheet has no data rows");
    }

    log::info!(
        "loaded {} row(s), {} column(s) from '{}'",
        rows.len(),
        columns.iter().filter(|c| !c.is_empty()).count(),
        path.display()
    );

    Ok(SheetData { columns, rows })
}
