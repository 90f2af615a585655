//! Candidate filtering against the user's criteria.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::HolderLookup;
use crate::config::BotSettings;
use crate::models::{NewToken, TokenSource};

pub struct TokenFilterEngine {
    holders: Option<Arc<dyn HolderLookup>>,
}

impl TokenFilterEngine {
    pub fn new(holders: Option<Arc<dyn HolderLookup>>) -> Self {
        Self { holders }
    }

    /// Pure accept/reject decision over the token's current fields.
    /// A token with no holder data counts as zero holders, so a holder
    /// floor above zero rejects it until a lookup succeeds.
    pub fn accept(token: &NewToken, settings: &BotSettings) -> bool {
        let market_cap = token.market_cap_sol;
        if market_cap < settings.min_market_cap || market_cap > settings.max_market_cap {
            debug!(
                "{} rejected: market cap {:.2} outside [{:.2}, {:.2}]",
                token.mint, market_cap, settings.min_market_cap, settings.max_market_cap
            );
            return false;
        }

        if token.liquidity_sol() < settings.min_liquidity {
            debug!(
                "{} rejected: liquidity {:.2} < {:.2}",
                token.mint,
                token.liquidity_sol(),
                settings.min_liquidity
            );
            return false;
        }

        if token.holders.unwrap_or(0) < settings.min_holders {
            debug!(
                "{} rejected: holders {:?} < {}",
                token.mint, token.holders, settings.min_holders
            );
            return false;
        }

        match settings
            .token_age_filter
            .lookback_days(settings.custom_days)
        {
            // Live-only mode: anything replayed from history is out
            None => token.source == TokenSource::Live,
            Some(days) => token.age_days(chrono::Utc::now()) <= f64::from(days),
        }
    }

    /// Best-effort holder enrichment for tokens with no count yet.
    /// Lookup failures never propagate; freshly created live tokens are
    /// skipped because no indexer has seen them yet.
    pub async fn refresh_holders(&self, token: &mut NewToken, settings: &BotSettings) {
        if settings.quick_mode {
            return;
        }
        if token.holders.is_some() {
            return;
        }
        if token.source == TokenSource::Live {
            return;
        }
        let Some(lookup) = &self.holders else {
            return;
        };

        match lookup.holder_count(&token.mint).await {
            Ok(count) => {
                token.holders = Some(count);
            }
            Err(e) => {
                warn!("Holder lookup failed for {}: {:?}", token.mint, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenAgeFilter;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    fn token(source: TokenSource) -> NewToken {
        NewToken {
            mint: "MintA".to_string(),
            symbol: "TKN".to_string(),
            name: "Token".to_string(),
            created_at: Utc::now(),
            source,
            sol_reserve: 30.0,
            token_reserve: 1_000_000.0,
            market_cap_sol: 30.0,
            holders: None,
            price_sol: Some(0.00003),
            signature: None,
        }
    }

    #[test]
    fn test_market_cap_below_min_rejected() {
        let mut settings = BotSettings::default();
        settings.min_market_cap = 50.0;
        assert!(!TokenFilterEngine::accept(&token(TokenSource::Live), &settings));
    }

    #[test]
    fn test_market_cap_above_max_rejected() {
        let mut settings = BotSettings::default();
        settings.max_market_cap = 10.0;
        assert!(!TokenFilterEngine::accept(&token(TokenSource::Live), &settings));
    }

    #[test]
    fn test_unknown_holders_counts_as_zero() {
        let mut settings = BotSettings::default();
        settings.min_holders = 1;
        let candidate = token(TokenSource::Live);
        assert!(candidate.holders.is_none());
        assert!(!TokenFilterEngine::accept(&candidate, &settings));

        settings.min_holders = 0;
        assert!(TokenFilterEngine::accept(&candidate, &settings));
    }

    #[test]
    fn test_liquidity_floor() {
        let mut settings = BotSettings::default();
        settings.min_liquidity = 100.0;
        assert!(!TokenFilterEngine::accept(&token(TokenSource::Live), &settings));
    }

    #[test]
    fn test_new_only_rejects_backfill() {
        let settings = BotSettings::default();
        assert_eq!(settings.token_age_filter, TokenAgeFilter::NewOnly);
        assert!(TokenFilterEngine::accept(&token(TokenSource::Live), &settings));
        assert!(!TokenFilterEngine::accept(&token(TokenSource::Backfill), &settings));
    }

    #[test]
    fn test_age_window_accepts_recent_backfill() {
        let mut settings = BotSettings::default();
        settings.token_age_filter = TokenAgeFilter::Last7Days;

        let mut candidate = token(TokenSource::Backfill);
        candidate.created_at = Utc::now() - Duration::days(3);
        assert!(TokenFilterEngine::accept(&candidate, &settings));

        candidate.created_at = Utc::now() - Duration::days(10);
        assert!(!TokenFilterEngine::accept(&candidate, &settings));
    }

    #[test]
    fn test_accept_is_deterministic() {
        let settings = BotSettings::default();
        let candidate = token(TokenSource::Live);
        let first = TokenFilterEngine::accept(&candidate, &settings);
        for _ in 0..10 {
            assert_eq!(TokenFilterEngine::accept(&candidate, &settings), first);
        }
    }

    struct FixedHolders(u64);

    #[async_trait]
    impl HolderLookup for FixedHolders {
        async fn holder_count(&self, _mint: &str) -> Result<u64> {
            Ok(self.0)
        }
    }

    struct FailingHolders;

    #[async_trait]
    impl HolderLookup for FailingHolders {
        async fn holder_count(&self, _mint: &str) -> Result<u64> {
            anyhow::bail!("lookup unavailable")
        }
    }

    #[tokio::test]
    async fn test_refresh_sets_holder_count() {
        let engine = TokenFilterEngine::new(Some(Arc::new(FixedHolders(42))));
        let settings = BotSettings::default();
        let mut candidate = token(TokenSource::Backfill);
        engine.refresh_holders(&mut candidate, &settings).await;
        assert_eq!(candidate.holders, Some(42));
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_holders_unknown() {
        let engine = TokenFilterEngine::new(Some(Arc::new(FailingHolders)));
        let settings = BotSettings::default();
        let mut candidate = token(TokenSource::Backfill);
        engine.refresh_holders(&mut candidate, &settings).await;
        assert!(candidate.holders.is_none());
    }

    #[tokio::test]
    async fn test_refresh_skips_known_holder_count() {
        // A token that already carries a count triggers no lookup
        let engine = TokenFilterEngine::new(Some(Arc::new(FixedHolders(42))));
        let settings = BotSettings::default();
        let mut candidate = token(TokenSource::Backfill);
        candidate.holders = Some(7);
        engine.refresh_holders(&mut candidate, &settings).await;
        assert_eq!(candidate.holders, Some(7));
    }

    #[tokio::test]
    async fn test_refresh_skips_live_tokens() {
        let engine = TokenFilterEngine::new(Some(Arc::new(FixedHolders(42))));
        let settings = BotSettings::default();
        let mut candidate = token(TokenSource::Live);
        engine.refresh_holders(&mut candidate, &settings).await;
        assert!(candidate.holders.is_none());
    }

    #[tokio::test]
    async fn test_refresh_skipped_in_quick_mode() {
        let engine = TokenFilterEngine::new(Some(Arc::new(FixedHolders(42))));
        let mut settings = BotSettings::default();
        settings.quick_mode = true;
        let mut candidate = token(TokenSource::Backfill);
        engine.refresh_holders(&mut candidate, &settings).await;
        assert!(candidate.holders.is_none());
    }
}
