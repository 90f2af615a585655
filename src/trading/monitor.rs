//! Monitoring lifecycle: wires the live feed, backfill, filter, ledger
//! and trader together behind a start/stop pair.
//!
//! All ledger mutations happen on the single event-loop task, so ordering
//! per mint follows event arrival order and no two mutations interleave.

use anyhow::Result;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::api::HistoricalTokenSource;
use crate::config::SettingsHandle;
use crate::models::TokenCache;
use crate::notify::{Notification, NotificationSink, PositionAction};
use crate::stream::backfill::HistoricalLoader;
use crate::stream::pumpportal::{PumpPortalStream, PumpPortalStreamConfig};
use crate::stream::{StreamEvent, TradeSide};
use crate::trading::filter::TokenFilterEngine;
use crate::trading::ledger::PositionLedger;
use crate::trading::trader::AutoTrader;

const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Everything one inbound event needs. Shared between the event-loop
/// task and tests that drive events by hand.
pub struct EventPipeline {
    pub settings: SettingsHandle,
    pub ledger: Arc<PositionLedger>,
    pub filter: Arc<TokenFilterEngine>,
    pub trader: Arc<AutoTrader>,
    pub notifier: NotificationSink,
    seen: Mutex<TokenCache>,
}

impl EventPipeline {
    pub fn new(
        settings: SettingsHandle,
        ledger: Arc<PositionLedger>,
        filter: Arc<TokenFilterEngine>,
        trader: Arc<AutoTrader>,
        notifier: NotificationSink,
        cache_size: usize,
    ) -> Self {
        Self {
            settings,
            ledger,
            filter,
            trader,
            notifier,
            seen: Mutex::new(TokenCache::new(cache_size)),
        }
    }

    /// Process one normalized event. Nothing that happens in here may
    /// take the event loop down.
    pub async fn handle(&self, event: StreamEvent) {
        match event {
            StreamEvent::Created(mut token) => {
                {
                    let mut seen = self.seen.lock().await;
                    if !seen.insert(&token.mint) {
                        debug!("Skipping already-seen mint {}", token.mint);
                        return;
                    }
                }

                let settings = self.settings.snapshot().await;
                self.filter.refresh_holders(&mut token, &settings).await;

                if !TokenFilterEngine::accept(&token, &settings) {
                    return;
                }

                info!("Candidate passed filters: {} ({})", token.symbol, token.mint);
                self.notifier.publish(Notification::NewToken {
                    token: token.clone(),
                    timestamp: Utc::now(),
                });

                self.trader.evaluate_new_token(&token).await;
            }

            StreamEvent::Trade(trade) => {
                if trade.side == TradeSide::Buy {
                    self.ledger.record_buy_fill(&trade.mint).await;
                }

                let Some(price) = trade.price_sol else {
                    return;
                };
                let Some(position) = self.ledger.apply_price_update(&trade.mint, price).await
                else {
                    return;
                };

                self.notifier.publish(Notification::PositionUpdate {
                    action: PositionAction::PriceUpdate,
                    position: position.clone(),
                    timestamp: Utc::now(),
                });

                self.trader.evaluate_position(&position).await;
            }
        }
    }
}

pub struct MonitorController {
    pipeline: Arc<EventPipeline>,
    stream_config: PumpPortalStreamConfig,
    stream: Mutex<Option<Arc<PumpPortalStream>>>,
    historical: Option<Arc<dyn HistoricalTokenSource>>,
    historical_fallback: Option<Arc<dyn HistoricalTokenSource>>,
    running: Arc<RwLock<bool>>,
    shutdown_tx: broadcast::Sender<()>,
    backfill_cancelled: Arc<AtomicBool>,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
    backfill_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl MonitorController {
    pub fn new(
        settings: SettingsHandle,
        ledger: Arc<PositionLedger>,
        filter: Arc<TokenFilterEngine>,
        trader: Arc<AutoTrader>,
        notifier: NotificationSink,
        stream_config: PumpPortalStreamConfig,
        historical: Option<Arc<dyn HistoricalTokenSource>>,
        historical_fallback: Option<Arc<dyn HistoricalTokenSource>>,
        cache_size: usize,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let pipeline = Arc::new(EventPipeline::new(
            settings, ledger, filter, trader, notifier, cache_size,
        ));

        Self {
            pipeline,
            stream_config,
            stream: Mutex::new(None),
            historical,
            historical_fallback,
            running: Arc::new(RwLock::new(false)),
            shutdown_tx,
            backfill_cancelled: Arc::new(AtomicBool::new(false)),
            loop_handle: Mutex::new(None),
            backfill_handle: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Start monitoring. Spawns the event loop, the live feed, and the
    /// backfill when the configured age window needs history. Safe to
    /// call again after [`stop`](Self::stop); each start gets a fresh
    /// ingestion channel and feed.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.write().await;
        if *running {
            warn!("Monitor start requested but already running");
            return Ok(());
        }
        *running = true;
        drop(running);

        self.backfill_cancelled.store(false, Ordering::SeqCst);

        let (event_tx, mut event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let stream = Arc::new(PumpPortalStream::new(
            self.stream_config.clone(),
            event_tx.clone(),
        ));

        info!("Starting monitor...");

        // Single consumer: all ledger mutations are serialized here
        let pipeline = self.pipeline.clone();
        let running = self.running.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Event loop received shutdown signal");
                        break;
                    }
                    event = event_rx.recv() => {
                        match event {
                            Some(event) => pipeline.handle(event).await,
                            None => {
                                warn!("Event channel closed, stopping event loop");
                                break;
                            }
                        }
                    }
                }
                if !*running.read().await {
                    break;
                }
            }
            info!("Event loop finished");
        });
        *self.loop_handle.lock().await = Some(handle);

        if let Err(e) = stream.start().await {
            // Roll back so a later start can try again
            *self.running.write().await = false;
            let _ = self.shutdown_tx.send(());
            if let Some(handle) = self.loop_handle.lock().await.take() {
                let _ = handle.await;
            }
            return Err(e);
        }
        *self.stream.lock().await = Some(stream);

        self.spawn_backfill_if_needed(event_tx).await;

        info!("Monitor started");
        Ok(())
    }

    async fn spawn_backfill_if_needed(&self, event_tx: mpsc::Sender<StreamEvent>) {
        let settings = self.pipeline.settings.snapshot().await;
        let Some(days) = settings
            .token_age_filter
            .lookback_days(settings.custom_days)
        else {
            return;
        };
        let Some(source) = self.historical.clone() else {
            debug!("Age window requires history but no historical source is configured");
            return;
        };

        let loader = HistoricalLoader::new(
            source,
            self.historical_fallback.clone(),
            event_tx,
            self.pipeline.notifier.clone(),
            self.backfill_cancelled.clone(),
        );
        let batch_size = settings.historical_batch_size;
        let notifier = self.pipeline.notifier.clone();

        let handle = tokio::spawn(async move {
            match loader.run(days, batch_size).await {
                Ok(count) => info!("Backfill task done, {} tokens replayed", count),
                Err(e) => {
                    error!("Backfill task failed: {:?}", e);
                    notifier.error(format!("Historical load failed: {}", e));
                }
            }
        });
        *self.backfill_handle.lock().await = Some(handle);
    }

    /// Stop monitoring. Idempotent; cancels the backfill cooperatively
    /// and returns once both background tasks have wound down.
    pub async fn stop(&self) -> Result<()> {
        let mut running = self.running.write().await;
        if !*running {
            debug!("Monitor stop requested but not running");
            return Ok(());
        }
        *running = false;
        drop(running);

        info!("Stopping monitor...");
        self.backfill_cancelled.store(true, Ordering::SeqCst);
        if let Some(stream) = self.stream.lock().await.take() {
            stream.stop().await;
        }
        let _ = self.shutdown_tx.send(());

        if let Some(handle) = self.backfill_handle.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Backfill task join error: {:?}", e);
            }
        }
        if let Some(handle) = self.loop_handle.lock().await.take() {
            if let Err(e) = handle.await {
                error!("Event loop join error: {:?}", e);
            }
        }

        info!("Monitor stopped");
        Ok(())
    }
}
