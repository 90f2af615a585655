//! Trade execution and the auto buy/sell policy.
//!
//! `TradeExecutor` is the seam to the outside world: the engine decides
//! WHAT to trade, the executor owns signing and broadcast. A failed
//! execution is abandoned, never retried, and leaves the ledger untouched.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::{BotSettings, SellStrategy, SettingsHandle};
use crate::error::SniperError;
use crate::models::{NewToken, Position, PositionPatch};
use crate::notify::{Notification, NotificationSink, PositionAction};
use crate::trading::ledger::PositionLedger;
use crate::trading::price;

const LAMPORTS_PER_SOL: f64 = 1e9;

/// Result of a confirmed trade.
#[derive(Debug, Clone)]
pub struct TradeOutcome {
    pub signature: String,
    /// Tokens received (buy) or sold (sell).
    pub token_amount: f64,
    /// SOL spent (buy) or received (sell).
    pub sol_amount: f64,
}

#[async_trait]
pub trait TradeExecutor: Send + Sync {
    async fn buy(
        &self,
        mint: &str,
        sol_amount: f64,
        slippage_percent: f64,
    ) -> Result<TradeOutcome, SniperError>;

    async fn sell(
        &self,
        mint: &str,
        token_amount: f64,
        slippage_percent: f64,
    ) -> Result<TradeOutcome, SniperError>;
}

/// Executor backed by the PumpPortal trade API. The API key authorizes a
/// server-side wallet, so no key material lives in this process.
pub struct PumpPortalTrader {
    api_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, serde::Deserialize)]
struct TradeResponse {
    signature: Option<String>,
    #[serde(rename = "outputAmount")]
    output_amount: Option<f64>,
    #[serde(default)]
    errors: Vec<String>,
}

impl PumpPortalTrader {
    pub fn new(api_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    async fn execute(
        &self,
        mint: &str,
        params: serde_json::Value,
    ) -> Result<TradeResponse, SniperError> {
        let mut url = format!("{}/trade", self.api_url);
        if let Some(key) = &self.api_key {
            url = format!("{}?api-key={}", url, key);
        }

        let response = self
            .client
            .post(&url)
            .json(&params)
            .send()
            .await
            .map_err(|e| SniperError::TradeFailed {
                mint: mint.to_string(),
                reason: format!("request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SniperError::TradeFailed {
                mint: mint.to_string(),
                reason: format!("API returned {}: {}", status, body),
            });
        }

        let data: TradeResponse =
            response.json().await.map_err(|e| SniperError::TradeFailed {
                mint: mint.to_string(),
                reason: format!("unparseable response: {}", e),
            })?;

        if !data.errors.is_empty() {
            return Err(SniperError::TradeFailed {
                mint: mint.to_string(),
                reason: data.errors.join("; "),
            });
        }
        Ok(data)
    }
}

#[async_trait]
impl TradeExecutor for PumpPortalTrader {
    async fn buy(
        &self,
        mint: &str,
        sol_amount: f64,
        slippage_percent: f64,
    ) -> Result<TradeOutcome, SniperError> {
        let params = json!({
            "action": "buy",
            "mint": mint,
            "sol": (sol_amount * LAMPORTS_PER_SOL) as u64,
            "slippage": (slippage_percent * 100.0) as u64,
            "pool": "pump",
        });

        let data = self.execute(mint, params).await?;
        let signature = data.signature.ok_or_else(|| SniperError::TradeFailed {
            mint: mint.to_string(),
            reason: "no signature in response".to_string(),
        })?;

        Ok(TradeOutcome {
            signature,
            token_amount: data.output_amount.unwrap_or(0.0),
            sol_amount,
        })
    }

    async fn sell(
        &self,
        mint: &str,
        token_amount: f64,
        slippage_percent: f64,
    ) -> Result<TradeOutcome, SniperError> {
        let params = json!({
            "action": "sell",
            "mint": mint,
            "amount": token_amount as u64,
            "slippage": (slippage_percent * 100.0) as u64,
            "pool": "pump",
        });

        let data = self.execute(mint, params).await?;
        let signature = data.signature.ok_or_else(|| SniperError::TradeFailed {
            mint: mint.to_string(),
            reason: "no signature in response".to_string(),
        })?;

        Ok(TradeOutcome {
            signature,
            token_amount,
            sol_amount: data.output_amount.unwrap_or(0.0) / LAMPORTS_PER_SOL,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellReason {
    ProfitTarget,
    StopLoss,
    BuyCount,
    HoldTime,
    Manual,
}

impl std::fmt::Display for SellReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProfitTarget => write!(f, "profit target"),
            Self::StopLoss => write!(f, "stop loss"),
            Self::BuyCount => write!(f, "buy count reached"),
            Self::HoldTime => write!(f, "hold time reached"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

pub struct AutoTrader {
    settings: SettingsHandle,
    ledger: Arc<PositionLedger>,
    executor: Arc<dyn TradeExecutor>,
    notifier: NotificationSink,
    /// Mints with a buy in flight. A manual buy racing the event loop
    /// for the same mint must not execute twice.
    buy_pending: Mutex<HashSet<String>>,
    /// Mints with a sell in flight. Guarantees one sell intent per
    /// trigger even when price updates arrive faster than execution.
    sell_pending: Mutex<HashSet<String>>,
}

impl AutoTrader {
    pub fn new(
        settings: SettingsHandle,
        ledger: Arc<PositionLedger>,
        executor: Arc<dyn TradeExecutor>,
        notifier: NotificationSink,
    ) -> Self {
        Self {
            settings,
            ledger,
            executor,
            notifier,
            buy_pending: Mutex::new(HashSet::new()),
            sell_pending: Mutex::new(HashSet::new()),
        }
    }

    /// Auto-buy gate for a token that passed the filters.
    pub async fn evaluate_new_token(&self, token: &NewToken) {
        let settings = self.settings.snapshot().await;
        if !settings.auto_buy {
            return;
        }
        if let Err(e) = self
            .buy(&token.mint, &token.symbol, &token.name, settings.sol_per_snipe, &settings)
            .await
        {
            warn!("Auto-buy skipped for {}: {}", token.mint, e);
        }
    }

    /// Manual buy. Bypasses the auto-buy switch but still honors the
    /// concurrent position cap and the one-position-per-mint rule.
    pub async fn manual_buy(
        &self,
        mint: &str,
        symbol: &str,
        name: &str,
        sol_amount: Option<f64>,
    ) -> Result<Position, SniperError> {
        let settings = self.settings.snapshot().await;
        let amount = sol_amount.unwrap_or(settings.sol_per_snipe);
        self.buy(mint, symbol, name, amount, &settings).await
    }

    async fn buy(
        &self,
        mint: &str,
        symbol: &str,
        name: &str,
        sol_amount: f64,
        settings: &BotSettings,
    ) -> Result<Position, SniperError> {
        // Take the guard before the position checks so two triggers for
        // the same mint cannot both reach the executor
        {
            let mut pending = self.buy_pending.lock().await;
            if !pending.insert(mint.to_string()) {
                return Err(SniperError::DuplicatePosition(mint.to_string()));
            }
        }

        let result = self.buy_inner(mint, symbol, name, sol_amount, settings).await;

        self.buy_pending.lock().await.remove(mint);
        result
    }

    async fn buy_inner(
        &self,
        mint: &str,
        symbol: &str,
        name: &str,
        sol_amount: f64,
        settings: &BotSettings,
    ) -> Result<Position, SniperError> {
        if self.ledger.has_active(mint).await {
            return Err(SniperError::DuplicatePosition(mint.to_string()));
        }
        if self.ledger.active_count().await >= settings.max_positions {
            return Err(SniperError::Validation(format!(
                "max positions ({}) reached",
                settings.max_positions
            )));
        }

        info!("Buying {:.4} SOL of {} ({})", sol_amount, symbol, mint);
        let outcome = match self
            .executor
            .buy(mint, sol_amount, settings.slippage_percent)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Buy failed for {}: {}", mint, e);
                self.notifier.error(format!("Buy failed for {}: {}", symbol, e));
                return Err(e);
            }
        };

        // Only confirmed trades touch the ledger
        let opened = self.ledger.open(mint, sol_amount, symbol, name).await?;
        self.notifier.publish(Notification::Transaction {
            mint: mint.to_string(),
            action: "buy".to_string(),
            sol_amount: outcome.sol_amount,
            signature: outcome.signature.clone(),
            timestamp: Utc::now(),
        });
        self.notifier.publish(Notification::PositionUpdate {
            action: PositionAction::Buy,
            position: opened.clone(),
            timestamp: Utc::now(),
        });

        // Fill details arrive with the execution result
        let entry_price = price::fill_price(outcome.sol_amount, outcome.token_amount);
        let position = match self
            .ledger
            .apply_metadata(
                mint,
                PositionPatch {
                    entry_price,
                    token_amount: Some(outcome.token_amount),
                    signature: Some(outcome.signature),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(merged) => {
                self.notifier.publish(Notification::PositionUpdate {
                    action: PositionAction::MetadataUpdate,
                    position: merged.clone(),
                    timestamp: Utc::now(),
                });
                merged
            }
            Err(_) => opened,
        };

        Ok(position)
    }

    /// Pure sell decision over one settings snapshot.
    pub fn should_sell(position: &Position, settings: &BotSettings) -> Option<SellReason> {
        if position.pnl_percent >= settings.profit_target_percent {
            return Some(SellReason::ProfitTarget);
        }
        if position.pnl_percent <= -settings.stop_loss_percent {
            return Some(SellReason::StopLoss);
        }
        match settings.sell_strategy {
            SellStrategy::ByBuys => {
                if position.buy_fill_count >= settings.sell_after_buys {
                    return Some(SellReason::BuyCount);
                }
            }
            SellStrategy::ByTime => {
                if position.held_seconds(Utc::now()) >= settings.sell_after_seconds {
                    return Some(SellReason::HoldTime);
                }
            }
        }
        None
    }

    /// Called by the event loop after every position update.
    pub async fn evaluate_position(&self, position: &Position) {
        let settings = self.settings.snapshot().await;
        if !settings.auto_sell {
            return;
        }
        let Some(reason) = Self::should_sell(position, &settings) else {
            return;
        };
        if let Err(e) = self.sell(&position.mint, reason, &settings).await {
            warn!("Auto-sell failed for {}: {}", position.mint, e);
        }
    }

    /// Manual sell. Bypasses the auto-sell switch but requires an active
    /// position and respects the in-flight guard.
    pub async fn manual_sell(&self, mint: &str) -> Result<Position, SniperError> {
        let settings = self.settings.snapshot().await;
        self.sell(mint, SellReason::Manual, &settings).await
    }

    async fn sell(
        &self,
        mint: &str,
        reason: SellReason,
        settings: &BotSettings,
    ) -> Result<Position, SniperError> {
        // Take the guard before looking at the position so a second
        // trigger for the same mint backs off immediately
        {
            let mut pending = self.sell_pending.lock().await;
            if !pending.insert(mint.to_string()) {
                return Err(SniperError::Validation(format!(
                    "sell already in flight for {}",
                    mint
                )));
            }
        }

        let result = self.sell_inner(mint, reason, settings).await;

        self.sell_pending.lock().await.remove(mint);
        result
    }

    async fn sell_inner(
        &self,
        mint: &str,
        reason: SellReason,
        settings: &BotSettings,
    ) -> Result<Position, SniperError> {
        let position = self
            .ledger
            .get(mint)
            .await
            .ok_or_else(|| SniperError::NoSuchPosition(mint.to_string()))?;

        if position.token_amount <= 0.0 {
            return Err(SniperError::TradeFailed {
                mint: mint.to_string(),
                reason: "token amount unknown, cannot size the sell".to_string(),
            });
        }

        info!(
            "Selling {} ({}) due to {} | PnL {:.2}%",
            position.symbol, mint, reason, position.pnl_percent
        );

        let outcome = match self
            .executor
            .sell(mint, position.token_amount, settings.slippage_percent)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                // Abandoned: the position stays open and a later trigger
                // may try again with a fresh intent
                warn!("Sell failed for {}: {}", mint, e);
                self.notifier
                    .error(format!("Sell failed for {}: {}", position.symbol, e));
                return Err(e);
            }
        };

        let closed = self.ledger.close(mint).await?;

        self.notifier.publish(Notification::Transaction {
            mint: mint.to_string(),
            action: "sell".to_string(),
            sol_amount: outcome.sol_amount,
            signature: outcome.signature,
            timestamp: Utc::now(),
        });
        self.notifier.publish(Notification::PositionUpdate {
            action: PositionAction::Sell,
            position: closed.clone(),
            timestamp: Utc::now(),
        });

        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsPatch;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockExecutor {
        buys: AtomicUsize,
        sells: AtomicUsize,
        fail_buys: bool,
        fail_sells: bool,
        /// Per-call latency, to widen race windows in tests
        delay_ms: u64,
    }

    impl MockExecutor {
        fn new() -> Self {
            Self {
                buys: AtomicUsize::new(0),
                sells: AtomicUsize::new(0),
                fail_buys: false,
                fail_sells: false,
                delay_ms: 0,
            }
        }
    }

    #[async_trait]
    impl TradeExecutor for MockExecutor {
        async fn buy(
            &self,
            mint: &str,
            sol_amount: f64,
            _slippage: f64,
        ) -> Result<TradeOutcome, SniperError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            self.buys.fetch_add(1, Ordering::SeqCst);
            if self.fail_buys {
                return Err(SniperError::TradeFailed {
                    mint: mint.to_string(),
                    reason: "mock buy failure".to_string(),
                });
            }
            Ok(TradeOutcome {
                signature: "buy-sig".to_string(),
                token_amount: sol_amount / 0.0001,
                sol_amount,
            })
        }

        async fn sell(
            &self,
            mint: &str,
            token_amount: f64,
            _slippage: f64,
        ) -> Result<TradeOutcome, SniperError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            self.sells.fetch_add(1, Ordering::SeqCst);
            if self.fail_sells {
                return Err(SniperError::TradeFailed {
                    mint: mint.to_string(),
                    reason: "mock sell failure".to_string(),
                });
            }
            Ok(TradeOutcome {
                signature: "sell-sig".to_string(),
                token_amount,
                sol_amount: token_amount * 0.0002,
            })
        }
    }

    struct TestRig {
        trader: Arc<AutoTrader>,
        ledger: Arc<PositionLedger>,
        settings: SettingsHandle,
        executor: Arc<MockExecutor>,
    }

    async fn trader_with(executor: MockExecutor) -> (Arc<AutoTrader>, Arc<PositionLedger>, SettingsHandle) {
        let rig = rig_with(executor).await;
        (rig.trader, rig.ledger, rig.settings)
    }

    async fn rig_with(executor: MockExecutor) -> TestRig {
        let settings = SettingsHandle::default();
        settings
            .update(SettingsPatch {
                auto_buy: Some(true),
                auto_sell: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        let ledger = Arc::new(PositionLedger::new());
        let executor = Arc::new(executor);
        let trader = Arc::new(AutoTrader::new(
            settings.clone(),
            ledger.clone(),
            executor.clone(),
            NotificationSink::new(64),
        ));
        TestRig {
            trader,
            ledger,
            settings,
            executor,
        }
    }

    fn live_token(mint: &str) -> NewToken {
        NewToken {
            mint: mint.to_string(),
            symbol: "TKN".to_string(),
            name: "Token".to_string(),
            created_at: Utc::now(),
            source: crate::models::TokenSource::Live,
            sol_reserve: 30.0,
            token_reserve: 1_000_000.0,
            market_cap_sol: 30.0,
            holders: None,
            price_sol: Some(0.00003),
            signature: None,
        }
    }

    #[tokio::test]
    async fn test_auto_buy_opens_position_with_fill_data() {
        let (trader, ledger, _) = trader_with(MockExecutor::new()).await;
        trader.evaluate_new_token(&live_token("MintA")).await;

        let position = ledger.get("MintA").await.unwrap();
        assert!(position.is_active);
        assert!(position.entry_price > 0.0);
        assert!(position.token_amount > 0.0);
        assert_eq!(position.last_signature.as_deref(), Some("buy-sig"));
    }

    #[tokio::test]
    async fn test_auto_buy_respects_gate() {
        let (trader, ledger, settings) = trader_with(MockExecutor::new()).await;
        settings
            .update(SettingsPatch {
                auto_buy: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        trader.evaluate_new_token(&live_token("MintA")).await;
        assert!(ledger.get("MintA").await.is_none());
    }

    #[tokio::test]
    async fn test_max_positions_blocks_buys() {
        let (trader, ledger, settings) = trader_with(MockExecutor::new()).await;
        settings
            .update(SettingsPatch {
                max_positions: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        trader.evaluate_new_token(&live_token("A")).await;
        trader.evaluate_new_token(&live_token("B")).await;
        trader.evaluate_new_token(&live_token("C")).await;

        assert_eq!(ledger.active_count().await, 2);
        assert!(ledger.get("C").await.is_none());

        // Manual buys honor the cap too
        let err = trader.manual_buy("D", "TKN", "Token", None).await;
        assert!(matches!(err, Err(SniperError::Validation(_))));
    }

    #[tokio::test]
    async fn test_manual_buy_bypasses_auto_gate() {
        let (trader, ledger, settings) = trader_with(MockExecutor::new()).await;
        settings
            .update(SettingsPatch {
                auto_buy: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        let position = trader
            .manual_buy("MintA", "TKN", "Token", Some(0.02))
            .await
            .unwrap();
        assert!((position.entry_sol - 0.02).abs() < f64::EPSILON);
        assert!(ledger.has_active("MintA").await);
    }

    #[tokio::test]
    async fn test_duplicate_buy_rejected_without_execution() {
        let executor = MockExecutor::new();
        let (trader, _, _) = trader_with(executor).await;
        trader.evaluate_new_token(&live_token("MintA")).await;

        let err = trader.manual_buy("MintA", "TKN", "Token", None).await;
        assert!(matches!(err, Err(SniperError::DuplicatePosition(_))));
    }

    #[tokio::test]
    async fn test_buy_failure_leaves_ledger_untouched() {
        let mut executor = MockExecutor::new();
        executor.fail_buys = true;
        let (trader, ledger, _) = trader_with(executor).await;

        trader.evaluate_new_token(&live_token("MintA")).await;
        assert!(ledger.get("MintA").await.is_none());
        assert_eq!(ledger.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_profit_target_triggers_single_sell() {
        let mut executor = MockExecutor::new();
        executor.delay_ms = 50;
        let rig = rig_with(executor).await;

        rig.trader.evaluate_new_token(&live_token("MintA")).await;
        // +100% on entry price of 0.0001
        let position = rig.ledger.apply_price_update("MintA", 0.0002).await.unwrap();
        assert!(position.pnl_percent >= 50.0);

        // Two concurrent updates while the sell is in flight: the guard
        // must collapse them into exactly one sell
        let t1 = {
            let trader = rig.trader.clone();
            let p = position.clone();
            tokio::spawn(async move { trader.evaluate_position(&p).await })
        };
        let t2 = {
            let trader = rig.trader.clone();
            let p = position.clone();
            tokio::spawn(async move { trader.evaluate_position(&p).await })
        };
        t1.await.unwrap();
        t2.await.unwrap();

        assert_eq!(rig.executor.sells.load(Ordering::SeqCst), 1);
        assert!(!rig.ledger.has_active("MintA").await);
        assert!(rig.ledger.get("MintA").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_buys_collapse_to_one() {
        let mut executor = MockExecutor::new();
        executor.delay_ms = 50;
        let rig = rig_with(executor).await;

        // Auto-buy and a manual buy race for the same mint; the guard
        // lets only one reach the executor
        let t1 = {
            let trader = rig.trader.clone();
            tokio::spawn(async move { trader.evaluate_new_token(&live_token("MintA")).await })
        };
        let t2 = {
            let trader = rig.trader.clone();
            tokio::spawn(async move {
                let _ = trader.manual_buy("MintA", "TKN", "Token", None).await;
            })
        };
        t1.await.unwrap();
        t2.await.unwrap();

        assert_eq!(rig.executor.buys.load(Ordering::SeqCst), 1);
        assert!(rig.ledger.has_active("MintA").await);
        assert_eq!(rig.ledger.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_stop_loss_triggers_sell() {
        let (trader, ledger, _) = trader_with(MockExecutor::new()).await;
        trader.evaluate_new_token(&live_token("MintA")).await;

        let position = ledger.apply_price_update("MintA", 0.00005).await.unwrap();
        assert!(position.pnl_percent <= -20.0);
        trader.evaluate_position(&position).await;
        assert!(!ledger.has_active("MintA").await);
    }

    #[tokio::test]
    async fn test_sell_after_buys_strategy() {
        let (trader, ledger, settings) = trader_with(MockExecutor::new()).await;
        settings
            .update(SettingsPatch {
                sell_strategy: Some(SellStrategy::ByBuys),
                sell_after_buys: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();

        trader.evaluate_new_token(&live_token("MintA")).await;
        for _ in 0..3 {
            ledger.record_buy_fill("MintA").await;
        }
        let position = ledger.apply_price_update("MintA", 0.0001).await.unwrap();
        trader.evaluate_position(&position).await;
        assert!(!ledger.has_active("MintA").await);
    }

    #[tokio::test]
    async fn test_sell_failure_keeps_position_active() {
        let mut executor = MockExecutor::new();
        executor.fail_sells = true;
        let (trader, ledger, _) = trader_with(executor).await;

        trader.evaluate_new_token(&live_token("MintA")).await;
        let position = ledger.apply_price_update("MintA", 0.0002).await.unwrap();
        trader.evaluate_position(&position).await;

        // Still held, and the guard was released for a later attempt
        assert!(ledger.has_active("MintA").await);
        let err = trader.manual_sell("MintA").await;
        assert!(matches!(err, Err(SniperError::TradeFailed { .. })));
    }

    #[tokio::test]
    async fn test_manual_sell_requires_position() {
        let (trader, _, _) = trader_with(MockExecutor::new()).await;
        let err = trader.manual_sell("Nope").await;
        assert!(matches!(err, Err(SniperError::NoSuchPosition(_))));
    }

    #[tokio::test]
    async fn test_auto_sell_gate_off_never_sells() {
        let (trader, ledger, settings) = trader_with(MockExecutor::new()).await;
        settings
            .update(SettingsPatch {
                auto_sell: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        trader.evaluate_new_token(&live_token("MintA")).await;
        let position = ledger.apply_price_update("MintA", 0.01).await.unwrap();
        trader.evaluate_position(&position).await;
        assert!(ledger.has_active("MintA").await);

        // But a manual sell still works
        let closed = trader.manual_sell("MintA").await.unwrap();
        assert!(!closed.is_active);
    }

    #[test]
    fn test_should_sell_ignores_unknown_pnl() {
        // No fill data yet: pnl stays 0 and the thresholds cannot fire
        let settings = BotSettings::default();
        let position = Position::new("MintA", "TKN", "Token", 0.01);
        assert!(AutoTrader::should_sell(&position, &settings).is_none());
    }
}
