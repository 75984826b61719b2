//! Duplicate detection against the remote store
//!
//! A failed existence check is treated as "not found": a transport hiccup
//! must not block an otherwise valid row, and a genuinely duplicated code
//! will still be rejected by the store on submission.

use crate::api::LabStore;

use super::fields::DatasetKind;

/// Check whether the business code already exists in the remote store.
pub async fn is_duplicate<S: LabStore + ?Sized>(
    store: &S,
    dataset: DatasetKind,
    code: &str,
) -> bool {
    match store.record_exists(dataset, code).await {
        Ok(found) => found,
        Err(err) => {
            log::warn!(
                "existence check for '{}' failed ({}), treating as not found",
                code,
                err
            );
            false
        }
    }
}
