//! The transformation-and-import pipeline
//!
//! One spreadsheet row flows through: column mapping -> duplicate check ->
//! derived field calculation -> reference resolution -> schema
//! transformation -> submission. The orchestrator drives the stages in
//! order and accounts for duplicates and failures.

pub mod calc;
pub mod duplicate;
pub mod fields;
pub mod mapping;
pub mod orchestrator;
pub mod resolve;
pub mod schema;
pub mod value;

/// One spreadsheet row: source column name -> untyped cell value, immutable
/// once loaded.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

pub use fields::DatasetKind;
pub use mapping::ColumnMapping;
pub use orchestrator::{
    run_import, FailurePolicy, ImportOptions, ImportProgress, ImportReport, RowOutcome,
};
