//! Reqwest-backed remote store client
//!
//! Carries the bearer credential on every call. Transport and status errors
//! surface immediately; retry policy belongs to the caller (there is none).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;

use super::models::{CreatedRecord, Page, ProducerReference, SampleReference};
use super::store::LabStore;
use crate::import::fields::DatasetKind;

/// Authenticated HTTP client for the remote store
#[derive(Debug, Clone)]
pub struct AgroClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl AgroClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("invalid response body from {}", url))
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("POST {} returned {}: {}", url, status, detail);
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("invalid response body from {}", url))
    }
}

#[async_trait]
impl LabStore for AgroClient {
    async fn record_exists(&self, dataset: DatasetKind, code: &str) -> Result<bool> {
        let url = self.url(&format!(
            "{}/lookup/{}",
            dataset.endpoint(),
            urlencoding::encode(code)
        ));
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        Ok(response.status() == StatusCode::OK)
    }

    async fn sample_by_code(&self, code: &str) -> Result<SampleReference> {
        self.get_json(&format!("sample/by-code/{}", urlencoding::encode(code)))
            .await
    }

    async fn search_producers(&self, key: &str) -> Result<Page<ProducerReference>> {
        self.get_json(&format!("producer/search?key={}", urlencoding::encode(key)))
            .await
    }

    async fn submit_record(
        &self,
        dataset: DatasetKind,
        body: &serde_json::Value,
    ) -> Result<CreatedRecord> {
        self.post_json(dataset.endpoint(), body).await
    }

    async fn submit_classification(&self, body: &serde_json::Value) -> Result<CreatedRecord> {
        self.post_json("classification", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = AgroClient::new("https://api.example.com/v1/", "t");
        assert_eq!(
            client.url("/analysis/lookup/A-1"),
            "https://api.example.com/v1/analysis/lookup/A-1"
        );
        assert_eq!(client.url("classification"), "https://api.example.com/v1/classification");
    }
}
