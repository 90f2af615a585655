//! Inbound event model and the single normalization point.
//!
//! Every raw PumpPortal payload passes through [`normalize`] exactly once,
//! whether it arrived over the live WebSocket or a historical replay.
//! Downstream code only ever sees [`StreamEvent`] values.

pub mod backfill;
pub mod pumpportal;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SniperError;
use crate::models::{NewToken, TokenSource};
use crate::trading::price;

/// The only pool this engine trades. Raydium/auto events are ignored.
pub const PUMP_POOL: &str = "pump";

/// Raw PumpPortal message with every field optional. Classification and
/// validation happen in [`normalize`], not in serde.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEvent {
    pub mint: Option<String>,
    pub pool: Option<String>,
    pub tx_type: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub signature: Option<String>,
    pub trader_public_key: Option<String>,
    pub timestamp: Option<i64>,

    pub v_sol_in_bonding_curve: Option<f64>,
    pub v_tokens_in_bonding_curve: Option<f64>,
    pub sol_amount: Option<f64>,
    pub token_amount: Option<f64>,
    pub market_cap_sol: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A trade fill against a tracked or trackable mint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub mint: String,
    pub side: TradeSide,
    /// SOL per token, when derivable. Reserve-based when available,
    /// fill-ratio otherwise.
    pub price_sol: Option<f64>,
    pub sol_amount: Option<f64>,
    pub token_amount: Option<f64>,
    pub market_cap_sol: Option<f64>,
    pub trader: Option<String>,
    pub signature: Option<String>,
}

#[derive(Debug, Clone)]
pub enum StreamEvent {
    Created(NewToken),
    Trade(TradeEvent),
}

/// Derive SOL-per-token for an event. Bonding curve reserves are the
/// authoritative source; a single fill's ratio is the fallback.
/// USD-denominated figures are never used.
fn derive_price(raw: &RawEvent) -> Option<f64> {
    if let (Some(sol), Some(tokens)) = (raw.v_sol_in_bonding_curve, raw.v_tokens_in_bonding_curve)
    {
        if let Ok(p) = price::price_per_token(sol, tokens) {
            return Some(p);
        }
    }
    price::fill_price(raw.sol_amount.unwrap_or(0.0), raw.token_amount.unwrap_or(0.0))
}

/// Normalize one raw payload.
///
/// `Ok(Some(event))` for a usable event, `Ok(None)` for events that are
/// deliberately ignored (wrong pool, subscription acks), `Err` for
/// malformed payloads the caller should count and drop.
pub fn normalize(raw: RawEvent) -> Result<Option<StreamEvent>, SniperError> {
    // Subscription confirmations and similar chatter have no txType
    let tx_type = match raw.tx_type.as_deref() {
        Some(t) => t,
        None => return Ok(None),
    };

    if let Some(pool) = raw.pool.as_deref() {
        if pool != PUMP_POOL {
            return Ok(None);
        }
    }

    let mint = raw
        .mint
        .clone()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| SniperError::Stream(format!("event without mint (txType={})", tx_type)))?;

    match tx_type {
        "create" => {
            // Derive before the metadata fields are moved out of raw
            let price_sol = derive_price(&raw);
            let created_at = raw
                .timestamp
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
                .unwrap_or_else(Utc::now);
            let token = NewToken {
                mint,
                symbol: raw.symbol.unwrap_or_else(|| "Unknown".to_string()),
                name: raw.name.unwrap_or_else(|| "Unknown".to_string()),
                created_at,
                source: TokenSource::Live,
                sol_reserve: raw.v_sol_in_bonding_curve.unwrap_or(0.0),
                token_reserve: raw.v_tokens_in_bonding_curve.unwrap_or(0.0),
                market_cap_sol: raw.market_cap_sol.unwrap_or(0.0),
                holders: None,
                price_sol,
                signature: raw.signature,
            };
            Ok(Some(StreamEvent::Created(token)))
        }
        "buy" | "sell" => {
            let side = if tx_type == "buy" {
                TradeSide::Buy
            } else {
                TradeSide::Sell
            };
            let price_sol = derive_price(&raw);
            Ok(Some(StreamEvent::Trade(TradeEvent {
                mint,
                side,
                price_sol,
                sol_amount: raw.sol_amount,
                token_amount: raw.token_amount,
                market_cap_sol: raw.market_cap_sol,
                trader: raw.trader_public_key,
                signature: raw.signature,
            })))
        }
        other => Err(SniperError::Stream(format!("unknown txType: {}", other))),
    }
}
