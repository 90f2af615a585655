use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::SniperError;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub pumpportal_ws_url: String,
    pub pumpportal_api_url: String,
    pub pumpportal_api_key: Option<String>,

    pub pumpfun_api_url: String,
    pub solanatracker_api_key: Option<String>,

    pub http_timeout_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            pumpportal_ws_url: env::var("PUMPPORTAL_WS_URL")
                .unwrap_or_else(|_| "wss://pumpportal.fun/api/data".to_string()),
            pumpportal_api_url: env::var("PUMPPORTAL_API_URL")
                .unwrap_or_else(|_| "https://pumpportal.fun/api".to_string()),
            pumpportal_api_key: env::var("PUMPPORTAL_API_KEY").ok(),

            pumpfun_api_url: env::var("PUMPFUN_API_URL")
                .unwrap_or_else(|_| "https://frontend-api-v3.pump.fun".to_string()),
            solanatracker_api_key: env::var("SOLANATRACKER_API_KEY").ok(),

            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        })
    }
}

/// Which condition triggers a strategy-based sell (on top of
/// profit target / stop loss, which always apply when auto-sell is on).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SellStrategy {
    /// Sell once the position has seen N buy-side fills from other wallets.
    ByBuys,
    /// Sell once the position has been held for the configured duration.
    ByTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAgeFilter {
    NewOnly,
    Last1Day,
    Last3Days,
    Last7Days,
    Last14Days,
    Last30Days,
    CustomDays,
}

impl TokenAgeFilter {
    /// Lookback window in days. `None` means live-only (no backfill).
    pub fn lookback_days(&self, custom_days: u32) -> Option<u32> {
        match self {
            Self::NewOnly => None,
            Self::Last1Day => Some(1),
            Self::Last3Days => Some(3),
            Self::Last7Days => Some(7),
            Self::Last14Days => Some(14),
            Self::Last30Days => Some(30),
            Self::CustomDays => Some(custom_days.max(1)),
        }
    }
}

/// User-tunable bot behavior. Decisions always read a single snapshot
/// of this struct so a concurrent update cannot produce a torn read.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BotSettings {
    pub sol_per_snipe: f64,
    pub max_positions: usize,
    pub profit_target_percent: f64,
    pub stop_loss_percent: f64,
    pub slippage_percent: f64,

    pub min_market_cap: f64,
    pub max_market_cap: f64,
    pub min_liquidity: f64,
    pub min_holders: u64,

    pub auto_buy: bool,
    pub auto_sell: bool,
    pub sell_strategy: SellStrategy,
    pub sell_after_buys: u64,
    pub sell_after_seconds: u64,

    pub token_age_filter: TokenAgeFilter,
    pub custom_days: u32,
    pub historical_batch_size: usize,
    pub new_token_cache_size: usize,

    /// Skip the holder-count lookup for faster reaction to new mints.
    pub quick_mode: bool,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            sol_per_snipe: 0.01,
            max_positions: 5,
            profit_target_percent: 50.0,
            stop_loss_percent: 20.0,
            slippage_percent: 5.0,

            min_market_cap: 0.0,
            max_market_cap: 100_000.0,
            min_liquidity: 0.0,
            min_holders: 0,

            auto_buy: false,
            auto_sell: true,
            sell_strategy: SellStrategy::ByTime,
            sell_after_buys: 10,
            sell_after_seconds: 3600,

            token_age_filter: TokenAgeFilter::NewOnly,
            custom_days: 7,
            historical_batch_size: 10,
            new_token_cache_size: 2000,

            quick_mode: false,
        }
    }
}

impl BotSettings {
    pub fn validate(&self) -> Result<(), SniperError> {
        if self.sol_per_snipe <= 0.0 || !self.sol_per_snipe.is_finite() {
            return Err(SniperError::Validation(format!(
                "sol_per_snipe must be positive, got {}",
                self.sol_per_snipe
            )));
        }
        if self.max_positions == 0 {
            return Err(SniperError::Validation(
                "max_positions must be at least 1".to_string(),
            ));
        }
        if self.profit_target_percent <= 0.0 {
            return Err(SniperError::Validation(format!(
                "profit_target_percent must be positive, got {}",
                self.profit_target_percent
            )));
        }
        if self.stop_loss_percent <= 0.0 {
            return Err(SniperError::Validation(format!(
                "stop_loss_percent must be positive, got {}",
                self.stop_loss_percent
            )));
        }
        if self.slippage_percent <= 0.0 || self.slippage_percent > 100.0 {
            return Err(SniperError::Validation(format!(
                "slippage_percent must be in (0, 100], got {}",
                self.slippage_percent
            )));
        }
        if self.min_market_cap < 0.0 || self.min_liquidity < 0.0 {
            return Err(SniperError::Validation(
                "market cap and liquidity floors must be non-negative".to_string(),
            ));
        }
        if self.max_market_cap < self.min_market_cap {
            return Err(SniperError::Validation(format!(
                "max_market_cap {} is below min_market_cap {}",
                self.max_market_cap, self.min_market_cap
            )));
        }
        if self.sell_after_buys == 0 {
            return Err(SniperError::Validation(
                "sell_after_buys must be at least 1".to_string(),
            ));
        }
        if self.sell_after_seconds == 0 {
            return Err(SniperError::Validation(
                "sell_after_seconds must be at least 1".to_string(),
            ));
        }
        if self.token_age_filter == TokenAgeFilter::CustomDays && self.custom_days == 0 {
            return Err(SniperError::Validation(
                "custom_days must be at least 1".to_string(),
            ));
        }
        if self.historical_batch_size == 0 {
            return Err(SniperError::Validation(
                "historical_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SettingsPatch {
    pub sol_per_snipe: Option<f64>,
    pub max_positions: Option<usize>,
    pub profit_target_percent: Option<f64>,
    pub stop_loss_percent: Option<f64>,
    pub slippage_percent: Option<f64>,
    pub min_market_cap: Option<f64>,
    pub max_market_cap: Option<f64>,
    pub min_liquidity: Option<f64>,
    pub min_holders: Option<u64>,
    pub auto_buy: Option<bool>,
    pub auto_sell: Option<bool>,
    pub sell_strategy: Option<SellStrategy>,
    pub sell_after_buys: Option<u64>,
    pub sell_after_seconds: Option<u64>,
    /// Legacy alias, converted to seconds when sell_after_seconds is absent.
    pub sell_after_hours: Option<f64>,
    pub token_age_filter: Option<TokenAgeFilter>,
    pub custom_days: Option<u32>,
    pub historical_batch_size: Option<usize>,
    pub new_token_cache_size: Option<usize>,
    pub quick_mode: Option<bool>,
}

impl SettingsPatch {
    fn apply_to(&self, base: &BotSettings) -> BotSettings {
        let mut next = base.clone();
        if let Some(v) = self.sol_per_snipe {
            next.sol_per_snipe = v;
        }
        if let Some(v) = self.max_positions {
            next.max_positions = v;
        }
        if let Some(v) = self.profit_target_percent {
            next.profit_target_percent = v;
        }
        if let Some(v) = self.stop_loss_percent {
            next.stop_loss_percent = v;
        }
        if let Some(v) = self.slippage_percent {
            next.slippage_percent = v;
        }
        if let Some(v) = self.min_market_cap {
            next.min_market_cap = v;
        }
        if let Some(v) = self.max_market_cap {
            next.max_market_cap = v;
        }
        if let Some(v) = self.min_liquidity {
            next.min_liquidity = v;
        }
        if let Some(v) = self.min_holders {
            next.min_holders = v;
        }
        if let Some(v) = self.auto_buy {
            next.auto_buy = v;
        }
        if let Some(v) = self.auto_sell {
            next.auto_sell = v;
        }
        if let Some(v) = self.sell_strategy {
            next.sell_strategy = v;
        }
        if let Some(v) = self.sell_after_buys {
            next.sell_after_buys = v;
        }
        if let Some(v) = self.sell_after_seconds {
            next.sell_after_seconds = v;
        } else if let Some(hours) = self.sell_after_hours {
            next.sell_after_seconds = (hours * 3600.0).round().max(1.0) as u64;
        }
        if let Some(v) = self.token_age_filter {
            next.token_age_filter = v;
        }
        if let Some(v) = self.custom_days {
            next.custom_days = v;
        }
        if let Some(v) = self.historical_batch_size {
            next.historical_batch_size = v;
        }
        if let Some(v) = self.new_token_cache_size {
            next.new_token_cache_size = v;
        }
        if let Some(v) = self.quick_mode {
            next.quick_mode = v;
        }
        next
    }
}

/// Shared handle to the live settings.
#[derive(Clone)]
pub struct SettingsHandle {
    inner: Arc<RwLock<BotSettings>>,
}

impl SettingsHandle {
    pub fn new(settings: BotSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub async fn snapshot(&self) -> BotSettings {
        self.inner.read().await.clone()
    }

    /// Validate the merged settings before committing. A rejected patch
    /// leaves the previous settings in effect.
    pub async fn update(&self, patch: SettingsPatch) -> Result<BotSettings, SniperError> {
        let mut guard = self.inner.write().await;
        let next = patch.apply_to(&guard);
        next.validate()?;
        *guard = next.clone();
        info!(
            "Settings updated: auto_buy={} auto_sell={} sol_per_snipe={} max_positions={}",
            next.auto_buy, next.auto_sell, next.sol_per_snipe, next.max_positions
        );
        Ok(next)
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(BotSettings::default())
    }
}
