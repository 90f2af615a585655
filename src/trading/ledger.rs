//! Authoritative in-memory position store.
//!
//! Every mutation takes the write lock once and completes inside that
//! critical section, so concurrent callers always observe a position
//! either before or after a mutation, never mid-merge.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::SniperError;
use crate::models::{Position, PositionPatch};

#[derive(Default)]
pub struct PositionLedger {
    positions: RwLock<HashMap<String, Position>>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a position for a mint. Fails if one is already active.
    /// Entry price and token amount may still be unknown at this point;
    /// they arrive later via [`apply_metadata`](Self::apply_metadata).
    pub async fn open(
        &self,
        mint: &str,
        entry_sol: f64,
        symbol: &str,
        name: &str,
    ) -> Result<Position, SniperError> {
        let mut positions = self.positions.write().await;
        if positions.contains_key(mint) {
            return Err(SniperError::DuplicatePosition(mint.to_string()));
        }

        let position = Position::new(mint, symbol, name, entry_sol);
        info!(
            "Opened position {} ({}) for {:.4} SOL",
            position.symbol, mint, entry_sol
        );
        positions.insert(mint.to_string(), position.clone());
        Ok(position)
    }

    /// Merge confirmed trade details or richer metadata into a position.
    /// Present, meaningful incoming values win; a known field is never
    /// overwritten with unknown or zero.
    pub async fn apply_metadata(
        &self,
        mint: &str,
        patch: PositionPatch,
    ) -> Result<Position, SniperError> {
        let mut positions = self.positions.write().await;
        let position = positions
            .get_mut(mint)
            .ok_or_else(|| SniperError::NoSuchPosition(mint.to_string()))?;

        if let Some(symbol) = patch.symbol.filter(|s| !s.is_empty() && s != "Unknown") {
            position.symbol = symbol;
        }
        if let Some(name) = patch.name.filter(|n| !n.is_empty() && n != "Unknown") {
            position.name = name;
        }
        if let Some(price) = patch.entry_price.filter(|p| *p > 0.0) {
            position.entry_price = price;
        }
        if let Some(sol) = patch.entry_sol.filter(|s| *s > 0.0) {
            position.entry_sol = sol;
        }
        if let Some(amount) = patch.token_amount.filter(|a| *a > 0.0) {
            position.token_amount = amount;
        }
        if let Some(signature) = patch.signature.filter(|s| !s.is_empty()) {
            position.last_signature = Some(signature);
        }

        position.recompute_pnl();
        Ok(position.clone())
    }

    /// Apply a price observation. Unknown mints are logged and skipped;
    /// a trade for a token we do not hold is routine, not an error.
    pub async fn apply_price_update(&self, mint: &str, price: f64) -> Option<Position> {
        if !(price.is_finite() && price >= 0.0) {
            warn!("Ignoring invalid price {} for {}", price, mint);
            return None;
        }
        let mut positions = self.positions.write().await;
        let position = match positions.get_mut(mint) {
            Some(p) => p,
            None => {
                // Routine: most trades on the feed are for mints we don't hold
                debug!("Price update for untracked mint {}", mint);
                return None;
            }
        };
        position.current_price = price;
        position.recompute_pnl();
        Some(position.clone())
    }

    /// Count a buy-side fill from another wallet against this position.
    pub async fn record_buy_fill(&self, mint: &str) -> Option<u64> {
        let mut positions = self.positions.write().await;
        let position = positions.get_mut(mint)?;
        position.buy_fill_count += 1;
        Some(position.buy_fill_count)
    }

    /// Close a position: evict it from the store and hand back the final
    /// snapshot with the exit time set. The store only ever holds open
    /// positions, so churning through many mints cannot grow it.
    pub async fn close(&self, mint: &str) -> Result<Position, SniperError> {
        let mut positions = self.positions.write().await;
        let mut position = positions
            .remove(mint)
            .ok_or_else(|| SniperError::NoSuchPosition(mint.to_string()))?;

        position.is_active = false;
        position.exit_time = Some(chrono::Utc::now());
        info!(
            "Closed position {} ({}) | PnL: {:.6} SOL ({:.2}%)",
            position.symbol, mint, position.pnl_sol, position.pnl_percent
        );
        Ok(position)
    }

    /// Administrative removal of an open position. Implies no trade;
    /// returns whether anything was deleted.
    pub async fn remove(&self, mint: &str) -> bool {
        self.positions.write().await.remove(mint).is_some()
    }

    pub async fn get(&self, mint: &str) -> Option<Position> {
        self.positions.read().await.get(mint).cloned()
    }

    pub async fn has_active(&self, mint: &str) -> bool {
        self.positions.read().await.contains_key(mint)
    }

    pub async fn active_count(&self) -> usize {
        self.positions.read().await.len()
    }

    /// Point-in-time copy of the open positions.
    pub async fn snapshot(&self) -> Vec<Position> {
        self.positions.read().await.values().cloned().collect()
    }

    pub async fn total_unrealized_pnl(&self) -> f64 {
        self.positions.read().await.values().map(|p| p.pnl_sol).sum()
    }
}
