//! Reference-data DTOs returned by the remote store

use serde::{Deserialize, Serialize};

/// Sample directory entry, looked up by business code for the analysis path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleReference {
    pub id: i64,
    pub plot_id: Option<String>,
    pub settlement: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub identification: Option<String>,
    pub property: Option<String>,
    /// Plot area in hectares; scales the per-area requirements
    #[serde(default)]
    pub area: f64,
}

impl SampleReference {
    /// Owner display name: first and last name concatenated and trimmed
    pub fn owner_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Producer directory entry, searched by key for the sample path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerReference {
    pub id: i64,
    pub plot: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub property: Option<String>,
    pub settlement: Option<String>,
    #[serde(default)]
    pub is_deleted: i64,
}

impl ProducerReference {
    pub fn owner_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// One page of a paginated search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Response to a successful record submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub id: i64,
}
