//! Schema transformation: working record -> submission payload
//!
//! The payload is always schema-complete: every field of the dataset schema
//! is emitted, defaulted first and then overwritten by whatever the working
//! record actually holds. A partially mapped input therefore still produces
//! a valid submission body.

use chrono::NaiveDate;

use super::fields::{DatasetKind, FieldDefault};
use super::value::WorkingRecord;

/// Default timestamp format for unset date fields
const DATE_DEFAULT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Build the external submission payload for one record.
pub fn to_submission(
    record: &WorkingRecord,
    dataset: DatasetKind,
    reference_date: NaiveDate,
) -> serde_json::Value {
    let mut payload = serde_json::Map::new();

    for field in dataset.fields() {
        let default = match field.default {
            FieldDefault::Null => serde_json::Value::Null,
            FieldDefault::Zero => serde_json::json!(0),
            FieldDefault::ReferenceDate => serde_json::Value::String(
                reference_date
                    .and_hms_opt(0, 0, 0)
                    .expect("midnight is always valid")
                    .format(DATE_DEFAULT_FORMAT)
                    .to_string(),
            ),
        };
        payload.insert(field.name.to_string(), default);
    }

    for (name, value) in record.iter() {
        // Only schema fields make it into the payload; stray working fields
        // would be rejected by the store.
        if dataset.field(name).is_some() {
            payload.insert(name.clone(), value.to_json());
        } else {
            log::warn!("dropping non-schema field '{}' from submission", name);
        }
    }

    serde_json::Value::Object(payload)
}
