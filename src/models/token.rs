use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Where a candidate token was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    /// Seen on the live WebSocket feed as it was created.
    Live,
    /// Replayed from a historical page fetch.
    Backfill,
}

/// A discovered Pump.fun token candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewToken {
    pub mint: String,
    pub symbol: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub source: TokenSource,

    /// Virtual SOL in the bonding curve. Doubles as the liquidity figure.
    pub sol_reserve: f64,
    /// Virtual token amount in the bonding curve.
    pub token_reserve: f64,
    pub market_cap_sol: f64,
    /// Holder count when known; brand-new mints have none yet.
    pub holders: Option<u64>,
    pub price_sol: Option<f64>,
    pub signature: Option<String>,
}

impl NewToken {
    pub fn liquidity_sol(&self) -> f64 {
        self.sol_reserve
    }

    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_seconds().max(0) as f64 / 86_400.0
    }
}

/// Bounded FIFO of recently seen mints. Keeps the discovery path from
/// reprocessing a mint that arrives on both the live feed and a backfill page.
#[derive(Debug)]
pub struct TokenCache {
    order: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl TokenCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            seen: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns false if the mint was already cached.
    pub fn insert(&mut self, mint: &str) -> bool {
        if self.seen.contains(mint) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        self.order.push_back(mint.to_string());
        self.seen.insert(mint.to_string());
        true
    }

    pub fn contains(&self, mint: &str) -> bool {
        self.seen.contains(mint)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
