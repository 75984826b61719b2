//! Remote store interface
//!
//! `LabStore` abstracts the authenticated HTTP calls the pipeline makes:
//! existence checks, reference lookups and record submissions. `AgroClient`
//! is the reqwest-backed implementation; tests substitute an in-memory mock.

pub mod client;
pub mod models;
pub mod store;

pub use client::AgroClient;
pub use models::{CreatedRecord, Page, ProducerReference, SampleReference};
pub use store::LabStore;
