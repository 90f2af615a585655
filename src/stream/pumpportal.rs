//! Live PumpPortal WebSocket feed.
//!
//! Connects to the data endpoint, subscribes to token-creation and trade
//! streams, and forwards normalized events into the ingestion channel.
//! Reconnects with a fixed delay on connection loss; position state lives
//! elsewhere, so a reconnect never loses tracked positions.

use anyhow::{anyhow, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::stream::{normalize, RawEvent, StreamEvent};

#[derive(Debug, Clone)]
pub struct PumpPortalStreamConfig {
    pub ws_url: String,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
}

impl Default for PumpPortalStreamConfig {
    fn default() -> Self {
        Self {
            ws_url: "wss://pumpportal.fun/api/data".to_string(),
            max_reconnect_attempts: 10,
            reconnect_delay_ms: 5000,
        }
    }
}

/// Statistics for the live feed
#[derive(Debug, Default, Clone)]
pub struct StreamStats {
    pub events_received: u64,
    pub events_dropped: u64,
    pub tokens_discovered: u64,
    pub reconnect_attempts: u32,
}

pub struct PumpPortalStream {
    config: PumpPortalStreamConfig,
    /// Channel feeding the event loop
    event_tx: mpsc::Sender<StreamEvent>,
    /// Flag to control the feed loop
    running: Arc<RwLock<bool>>,
    /// Shutdown signal broadcaster
    shutdown_tx: broadcast::Sender<()>,
    stats: Arc<RwLock<StreamStats>>,
}

impl PumpPortalStream {
    pub fn new(config: PumpPortalStreamConfig, event_tx: mpsc::Sender<StreamEvent>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            event_tx,
            running: Arc::new(RwLock::new(false)),
            shutdown_tx,
            stats: Arc::new(RwLock::new(StreamStats::default())),
        }
    }

    /// Start the feed. Returns immediately after spawning the background task.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.write().await;
        if *running {
            return Err(anyhow!("PumpPortal stream is already running"));
        }
        *running = true;
        drop(running);

        info!("Starting PumpPortal feed: {}", self.config.ws_url);

        let config = self.config.clone();
        let event_tx = self.event_tx.clone();
        let running = self.running.clone();
        let stats = self.stats.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut reconnect_attempts = 0u32;

            loop {
                if !*running.read().await {
                    info!("PumpPortal feed stopped by request");
                    break;
                }

                match Self::run_subscription(&config, &event_tx, &stats, &mut shutdown_rx).await {
                    Ok(_) => {
                        info!("PumpPortal subscription ended normally");
                        break;
                    }
                    Err(e) => {
                        error!("PumpPortal feed error: {:?}", e);
                        reconnect_attempts += 1;

                        {
                            let mut s = stats.write().await;
                            s.reconnect_attempts = reconnect_attempts;
                        }

                        if reconnect_attempts >= config.max_reconnect_attempts {
                            error!("Max reconnection attempts reached, stopping PumpPortal feed");
                            *running.write().await = false;
                            break;
                        }

                        warn!(
                            "Reconnecting in {}ms (attempt {}/{})",
                            config.reconnect_delay_ms,
                            reconnect_attempts,
                            config.max_reconnect_attempts
                        );
                        tokio::time::sleep(tokio::time::Duration::from_millis(
                            config.reconnect_delay_ms,
                        ))
                        .await;
                    }
                }
            }
        });

        Ok(())
    }

    /// Stop the feed. Safe to call when not running.
    pub async fn stop(&self) {
        info!("Stopping PumpPortal feed...");
        *self.running.write().await = false;
        let _ = self.shutdown_tx.send(());
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn get_stats(&self) -> StreamStats {
        self.stats.read().await.clone()
    }

    async fn run_subscription(
        config: &PumpPortalStreamConfig,
        event_tx: &mpsc::Sender<StreamEvent>,
        stats: &Arc<RwLock<StreamStats>>,
        shutdown_rx: &mut broadcast::Receiver<()>,
    ) -> Result<()> {
        info!("Connecting to PumpPortal WebSocket...");

        let (ws_stream, _) = connect_async(&config.ws_url)
            .await
            .context("Failed to connect to PumpPortal WebSocket")?;
        let (mut write, mut read) = ws_stream.split();

        // Subscribe to new token creations and all token trades
        for method in ["subscribeNewToken", "subscribeTokenTrade"] {
            let payload = json!({ "method": method }).to_string();
            write
                .send(Message::Text(payload))
                .await
                .with_context(|| format!("Failed to send {}", method))?;
        }

        info!("Subscribed to PumpPortal token and trade streams");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal");
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            {
                                let mut s = stats.write().await;
                                s.events_received += 1;
                            }
                            Self::process_text(&text, event_tx, stats).await;
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = write.send(Message::Pong(payload)).await;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            warn!("PumpPortal closed the connection: {:?}", frame);
                            return Err(anyhow!("connection closed by server"));
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            return Err(e).context("WebSocket read error");
                        }
                        None => {
                            warn!("PumpPortal stream ended unexpectedly");
                            return Err(anyhow!("stream ended"));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Parse and normalize one frame. Malformed frames are logged,
    /// counted and dropped; they never abort the subscription.
    async fn process_text(
        text: &str,
        event_tx: &mpsc::Sender<StreamEvent>,
        stats: &Arc<RwLock<StreamStats>>,
    ) {
        let raw: RawEvent = match serde_json::from_str(text) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Dropping unparseable PumpPortal frame: {}", e);
                let mut s = stats.write().await;
                s.events_dropped += 1;
                return;
            }
        };

        match normalize(raw) {
            Ok(Some(event)) => {
                if let StreamEvent::Created(token) = &event {
                    debug!("New token on feed: {} ({})", token.symbol, token.mint);
                    let mut s = stats.write().await;
                    s.tokens_discovered += 1;
                }
                if let Err(e) = event_tx.send(event).await {
                    error!("Failed to forward event to channel: {:?}", e);
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Dropping malformed event: {}", e);
                let mut s = stats.write().await;
                s.events_dropped += 1;
            }
        }
    }
}
