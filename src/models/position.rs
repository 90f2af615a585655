use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open (or closed) holding of a single mint, keyed by mint address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub mint: String,
    pub symbol: String,
    pub name: String,

    pub entry_time: DateTime<Utc>,
    /// SOL spent to open the position.
    pub entry_sol: f64,
    /// Entry price in SOL per token. Zero until the fill is known.
    pub entry_price: f64,
    /// Tokens received. Zero until the fill is known.
    pub token_amount: f64,

    pub current_price: f64,
    pub pnl_sol: f64,
    pub pnl_percent: f64,

    /// Buy-side fills from other wallets observed since entry.
    pub buy_fill_count: u64,

    pub is_active: bool,
    pub exit_time: Option<DateTime<Utc>>,
    pub last_signature: Option<String>,
}

impl Position {
    pub fn new(mint: &str, symbol: &str, name: &str, entry_sol: f64) -> Self {
        Self {
            mint: mint.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            entry_time: Utc::now(),
            entry_sol,
            entry_price: 0.0,
            token_amount: 0.0,
            current_price: 0.0,
            pnl_sol: 0.0,
            pnl_percent: 0.0,
            buy_fill_count: 0,
            is_active: true,
            exit_time: None,
            last_signature: None,
        }
    }

    /// Recompute P&L from entry and current price. Without a known entry
    /// price and token amount the P&L stays at zero rather than guessing.
    /// The percentage is relative to the SOL originally spent.
    pub fn recompute_pnl(&mut self) {
        if self.entry_price > 0.0 && self.token_amount > 0.0 {
            self.pnl_sol = (self.current_price - self.entry_price) * self.token_amount;
            self.pnl_percent = if self.entry_sol > 0.0 {
                self.pnl_sol / self.entry_sol * 100.0
            } else {
                (self.current_price - self.entry_price) / self.entry_price * 100.0
            };
        } else {
            self.pnl_sol = 0.0;
            self.pnl_percent = 0.0;
        }
    }

    pub fn held_seconds(&self, now: DateTime<Utc>) -> u64 {
        (now - self.entry_time).num_seconds().max(0) as u64
    }
}

/// Partial update merged into an existing position. Only present,
/// meaningful values overwrite; a field never downgrades to unknown.
#[derive(Debug, Clone, Default)]
pub struct PositionPatch {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub entry_price: Option<f64>,
    pub entry_sol: Option<f64>,
    pub token_amount: Option<f64>,
    pub signature: Option<String>,
}
