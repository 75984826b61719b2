//! The remote-store contract consumed by the pipeline

use anyhow::Result;
use async_trait::async_trait;

use super::models::{CreatedRecord, Page, ProducerReference, SampleReference};
use crate::import::fields::DatasetKind;

/// Calls the pipeline makes against the remote store. All methods assume an
/// already-authenticated transport; no retries happen at this level.
#[async_trait]
pub trait LabStore: Send + Sync {
    /// Existence check for duplicate detection:
    /// `GET /{dataset}/lookup/{code}` -> true on 200
    async fn record_exists(&self, dataset: DatasetKind, code: &str) -> Result<bool>;

    /// Sample directory lookup for the analysis path:
    /// `GET /sample/by-code/{code}`
    async fn sample_by_code(&self, code: &str) -> Result<SampleReference>;

    /// Paginated producer search for the sample path:
    /// `GET /producer/search?key=...`
    async fn search_producers(&self, key: &str) -> Result<Page<ProducerReference>>;

    /// Primary record submission: `POST /{dataset}`
    async fn submit_record(
        &self,
        dataset: DatasetKind,
        body: &serde_json::Value,
    ) -> Result<CreatedRecord>;

    /// Dependent classification submission (analysis only):
    /// `POST /classification`
    async fn submit_classification(&self, body: &serde_json::Value) -> Result<CreatedRecord>;
}
