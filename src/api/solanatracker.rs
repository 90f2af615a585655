//! SolanaTracker holder lookup.
//!
//! Used to enrich candidates with a holder count. Callers treat failures
//! as "holder count unknown", so every error path here is soft.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::SniperError;

const SOLANATRACKER_BASE_URL: &str = "https://data.solanatracker.io";

/// Anything that can answer "how many wallets hold this mint".
#[async_trait]
pub trait HolderLookup: Send + Sync {
    async fn holder_count(&self, mint: &str) -> Result<u64>;
}

#[derive(Debug, Deserialize)]
struct HoldersResponse {
    total: Option<u64>,
    #[serde(default)]
    holders: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct SolanaTrackerClient {
    api_key: Option<String>,
    base_url: String,
    client: Client,
}

impl SolanaTrackerClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_key,
            base_url: SOLANATRACKER_BASE_URL.to_string(),
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to create HTTP client for SolanaTracker")?,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

#[async_trait]
impl HolderLookup for SolanaTrackerClient {
    async fn holder_count(&self, mint: &str) -> Result<u64> {
        let url = format!("{}/tokens/{}/holders", self.base_url, mint);
        debug!("Fetching holder count for {}", mint);

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to SolanaTracker holders endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("SolanaTracker holders error for {}: {} - {}", mint, status, body);
            return Err(SniperError::Api(format!("SolanaTracker returned {}", status)).into());
        }

        let data: HoldersResponse = response
            .json()
            .await
            .context("Failed to parse SolanaTracker holders response")?;

        // Prefer the explicit total, fall back to counting the page
        Ok(data.total.unwrap_or(data.holders.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::ServerGuard) -> SolanaTrackerClient {
        SolanaTrackerClient::new(Some("test-key".to_string()), Duration::from_secs(2))
            .unwrap()
            .with_base_url(&server.url())
    }

    #[tokio::test]
    async fn test_holder_count_uses_total() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tokens/MintA/holders")
            .with_status(200)
            .with_body(r#"{"total": 123, "holders": [{}, {}]}"#)
            .create_async()
            .await;

        let count = client(&server).holder_count("MintA").await.unwrap();
        assert_eq!(count, 123);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_holder_count_falls_back_to_page_length() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tokens/MintA/holders")
            .with_status(200)
            .with_body(r#"{"holders": [{}, {}, {}]}"#)
            .create_async()
            .await;

        let count = client(&server).holder_count("MintA").await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_holder_count_error_status_is_err() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tokens/MintA/holders")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        assert!(client(&server).holder_count("MintA").await.is_err());
    }
}
