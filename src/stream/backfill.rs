//! Cancellable historical token backfill.
//!
//! Fetches recent token pages and replays them through the same ingestion
//! channel the live feed uses, in small batches so a stop request never
//! waits behind a large page. Tokens already forwarded when a run is
//! cancelled stay processed; there is no rollback and no automatic retry.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::HistoricalTokenSource;
use crate::models::NewToken;
use crate::notify::{Notification, NotificationSink};
use crate::stream::StreamEvent;

/// Cap on tokens pulled per run, across all pages.
const MAX_TOKENS_PER_RUN: usize = 500;

pub struct HistoricalLoader {
    source: Arc<dyn HistoricalTokenSource>,
    fallback: Option<Arc<dyn HistoricalTokenSource>>,
    event_tx: mpsc::Sender<StreamEvent>,
    notifier: NotificationSink,
    cancelled: Arc<AtomicBool>,
    /// Pause between batches, keeps downstream consumers from being flooded
    batch_delay_ms: u64,
}

impl HistoricalLoader {
    pub fn new(
        source: Arc<dyn HistoricalTokenSource>,
        fallback: Option<Arc<dyn HistoricalTokenSource>>,
        event_tx: mpsc::Sender<StreamEvent>,
        notifier: NotificationSink,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            fallback,
            event_tx,
            notifier,
            cancelled,
            batch_delay_ms: 100,
        }
    }

    #[cfg(test)]
    fn with_batch_delay(mut self, ms: u64) -> Self {
        self.batch_delay_ms = ms;
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fetch and replay tokens created within the lookback window.
    /// Returns the number of tokens forwarded before completion or
    /// cancellation.
    pub async fn run(&self, lookback_days: u32, batch_size: usize) -> Result<usize> {
        if self.is_cancelled() {
            info!("Backfill cancelled before any fetch");
            return Ok(0);
        }

        let tokens = self.fetch_tokens(lookback_days).await?;

        // Cancellation may have arrived while the page fetch was in flight
        if self.is_cancelled() {
            info!("Backfill cancelled after page fetch, dropping {} tokens", tokens.len());
            return Ok(0);
        }

        let total = tokens.len();
        let batch_size = batch_size.max(1);
        info!(
            "Replaying {} historical tokens in batches of {}",
            total, batch_size
        );

        let mut processed = 0usize;
        let mut batches = tokens.chunks(batch_size).peekable();

        while let Some(batch) = batches.next() {
            if self.is_cancelled() {
                info!("Backfill cancelled at batch boundary ({}/{} tokens)", processed, total);
                break;
            }

            for token in batch {
                if self.is_cancelled() {
                    break;
                }
                if self
                    .event_tx
                    .send(StreamEvent::Created(token.clone()))
                    .await
                    .is_err()
                {
                    warn!("Ingestion channel closed, stopping backfill");
                    self.report_progress(processed, total, true);
                    return Ok(processed);
                }
                processed += 1;
            }

            self.report_progress(processed, total, false);

            if batches.peek().is_some() && !self.is_cancelled() {
                tokio::time::sleep(tokio::time::Duration::from_millis(self.batch_delay_ms)).await;
            }
        }

        self.report_progress(processed, total, true);
        info!("Backfill finished: {}/{} tokens replayed", processed, total);
        Ok(processed)
    }

    /// Primary source first, fallback on failure. Both failing is a real
    /// error for the caller to report; a cancelled run is not.
    async fn fetch_tokens(&self, lookback_days: u32) -> Result<Vec<NewToken>> {
        let raw = match self
            .source
            .recent_tokens(lookback_days, MAX_TOKENS_PER_RUN, &self.cancelled)
            .await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Primary historical source failed: {:?}", e);
                match &self.fallback {
                    Some(fallback) => fallback
                        .recent_tokens(lookback_days, MAX_TOKENS_PER_RUN, &self.cancelled)
                        .await
                        .context("Fallback historical source failed")?,
                    None => return Err(e).context("Historical fetch failed with no fallback"),
                }
            }
        };

        // Pages can overlap between sources, keep the first sighting
        let mut seen = HashSet::new();
        let tokens: Vec<NewToken> = raw
            .into_iter()
            .filter(|t| seen.insert(t.mint.clone()))
            .collect();
        Ok(tokens)
    }

    fn report_progress(&self, processed: usize, total: usize, done: bool) {
        self.notifier.publish(Notification::LoadingStatus {
            message: if done {
                format!("Historical load complete: {}/{} tokens", processed, total)
            } else {
                format!("Loading historical tokens: {}/{}", processed, total)
            },
            processed,
            total,
            done,
            timestamp: Utc::now(),
        });
    }
}
