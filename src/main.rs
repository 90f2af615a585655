use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod models;
mod notify;
mod stream;
mod trading;

use crate::api::{PumpFunClient, SolanaTrackerClient};
use crate::config::{BotSettings, Config, SettingsHandle};
use crate::notify::NotificationSink;
use crate::stream::pumpportal::PumpPortalStreamConfig;
use crate::trading::{
    AutoTrader, MonitorController, PositionLedger, PumpPortalTrader, TokenFilterEngine,
    TradeExecutor,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok();

    let config = Config::load()?;
    info!("Configuration loaded");

    let timeout = Duration::from_secs(config.http_timeout_secs);
    let settings = SettingsHandle::new(BotSettings::default());
    let notifier = NotificationSink::default();
    let ledger = Arc::new(PositionLedger::new());

    let holder_client = Arc::new(
        SolanaTrackerClient::new(config.solanatracker_api_key.clone(), timeout)
            .context("Failed to build SolanaTracker client")?,
    );
    let filter = Arc::new(TokenFilterEngine::new(Some(holder_client)));

    let executor: Arc<dyn TradeExecutor> = Arc::new(
        PumpPortalTrader::new(
            &config.pumpportal_api_url,
            config.pumpportal_api_key.clone(),
            timeout,
        )
        .context("Failed to build trade executor")?,
    );
    let trader = Arc::new(AutoTrader::new(
        settings.clone(),
        ledger.clone(),
        executor,
        notifier.clone(),
    ));

    let historical = Arc::new(
        PumpFunClient::new(&config.pumpfun_api_url, timeout)
            .context("Failed to build Pump.fun client")?,
    );

    let cache_size = settings.snapshot().await.new_token_cache_size;
    let controller = MonitorController::new(
        settings,
        ledger,
        filter,
        trader,
        notifier,
        PumpPortalStreamConfig {
            ws_url: config.pumpportal_ws_url.clone(),
            ..Default::default()
        },
        Some(historical),
        None,
        cache_size,
    );

    controller.start().await?;
    info!("Sniper running, press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutdown requested");
    controller.stop().await?;

    Ok(())
}
