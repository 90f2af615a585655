//! Spot price derivation from bonding curve state.

use crate::error::SniperError;

/// Price in SOL per token from the virtual bonding curve reserves.
///
/// The curve quotes both sides, so the spot price is simply the ratio.
/// A non-positive token reserve means the curve state is unusable and
/// callers must not silently treat it as a zero price.
pub fn price_per_token(sol_reserve: f64, token_reserve: f64) -> Result<f64, SniperError> {
    if !sol_reserve.is_finite() || !token_reserve.is_finite() {
        return Err(SniperError::InvalidReserve(format!(
            "non-finite reserves: sol={} token={}",
            sol_reserve, token_reserve
        )));
    }
    if token_reserve <= 0.0 {
        return Err(SniperError::InvalidReserve(format!(
            "token reserve must be positive, got {}",
            token_reserve
        )));
    }
    Ok(sol_reserve / token_reserve)
}

/// Effective price of a single fill: SOL paid over tokens moved.
/// Used as a fallback when an event carries no curve reserves.
pub fn fill_price(sol_amount: f64, token_amount: f64) -> Option<f64> {
    if sol_amount.is_finite() && token_amount.is_finite() && token_amount > 0.0 && sol_amount > 0.0
    {
        Some(sol_amount / token_amount)
    } else {
        None
    }
}
