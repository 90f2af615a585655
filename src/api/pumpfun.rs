//! Pump.fun frontend API client for historical token pages.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::SniperError;
use crate::models::{NewToken, TokenSource};

const LAMPORTS_PER_SOL: f64 = 1e9;
/// Pump.fun tokens use 6 decimals.
const TOKEN_UNITS: f64 = 1e6;
const PAGE_SIZE: usize = 50;

/// Source of historical token pages. The backfill loader only depends on
/// this, so a fallback source slots in behind the same interface.
#[async_trait]
pub trait HistoricalTokenSource: Send + Sync {
    /// Tokens created within the last `lookback_days`, newest first,
    /// at most `limit` of them. Implementations check `cancelled`
    /// between page fetches and return what they have so far once it
    /// is set, so a stop request never waits out a full multi-page run.
    async fn recent_tokens(
        &self,
        lookback_days: u32,
        limit: usize,
        cancelled: &AtomicBool,
    ) -> Result<Vec<NewToken>>;
}

#[derive(Debug, Deserialize)]
struct CoinRecord {
    mint: String,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    /// Milliseconds since epoch
    #[serde(default)]
    created_timestamp: Option<i64>,
    /// Market cap in SOL
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    virtual_sol_reserves: Option<f64>,
    #[serde(default)]
    virtual_token_reserves: Option<f64>,
}

impl CoinRecord {
    fn into_token(self) -> NewToken {
        let created_at = self
            .created_timestamp
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);
        let sol_reserve = self.virtual_sol_reserves.unwrap_or(0.0) / LAMPORTS_PER_SOL;
        let token_reserve = self.virtual_token_reserves.unwrap_or(0.0) / TOKEN_UNITS;
        NewToken {
            mint: self.mint,
            symbol: self.symbol.unwrap_or_else(|| "Unknown".to_string()),
            name: self.name.unwrap_or_else(|| "Unknown".to_string()),
            created_at,
            source: TokenSource::Backfill,
            sol_reserve,
            token_reserve,
            market_cap_sol: self.market_cap.unwrap_or(0.0),
            holders: None,
            price_sol: if token_reserve > 0.0 {
                Some(sol_reserve / token_reserve)
            } else {
                None
            },
            signature: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PumpFunClient {
    base_url: String,
    client: Client,
}

impl PumpFunClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to create HTTP client for Pump.fun")?,
        })
    }

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<CoinRecord>> {
        let url = format!("{}/coins", self.base_url);
        debug!("Fetching Pump.fun coins page: offset={} limit={}", offset, limit);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
                ("sort", "created_timestamp".to_string()),
                ("order", "DESC".to_string()),
                ("includeNsfw", "true".to_string()),
            ])
            .send()
            .await
            .context("Failed to send request to Pump.fun coins endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Pump.fun coins API error: {} - {}", status, body);
            return Err(SniperError::Api(format!("Pump.fun returned {}", status)).into());
        }

        response
            .json()
            .await
            .context("Failed to parse Pump.fun coins response")
    }
}

#[async_trait]
impl HistoricalTokenSource for PumpFunClient {
    async fn recent_tokens(
        &self,
        lookback_days: u32,
        limit: usize,
        cancelled: &AtomicBool,
    ) -> Result<Vec<NewToken>> {
        let cutoff = Utc::now() - ChronoDuration::days(lookback_days as i64);
        let mut tokens = Vec::new();
        let mut offset = 0;

        // Pages are newest-first, so stop at the first token past the cutoff
        'pages: while tokens.len() < limit {
            if cancelled.load(Ordering::SeqCst) {
                info!(
                    "Historical fetch cancelled after {} token(s)",
                    tokens.len()
                );
                break;
            }

            let page = self.fetch_page(offset, PAGE_SIZE).await?;
            if page.is_empty() {
                break;
            }
            let page_len = page.len();
            offset += page_len;

            for record in page {
                let token = record.into_token();
                if token.created_at < cutoff {
                    break 'pages;
                }
                tokens.push(token);
                if tokens.len() >= limit {
                    break 'pages;
                }
            }

            // A short page is the last page
            if page_len < PAGE_SIZE {
                break;
            }
        }

        info!(
            "Fetched {} historical tokens within the last {} day(s)",
            tokens.len(),
            lookback_days
        );
        Ok(tokens)
    }
}
