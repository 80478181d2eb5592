//! Price feed and clock adapters.

use serde::{Deserialize, Serialize};

use crate::core::types::FeedId;
use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE QUOTE
// ═══════════════════════════════════════════════════════════════════════════════

/// A single price quote as reported by an external source.
///
/// Quotes are fetched on demand and never stored by the engine. The raw
/// price is signed because external sources can and do report non-positive
/// values; the engine rejects those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Raw price in the source's native precision
    pub price: i128,
    /// Unix timestamp of the source's last update
    pub updated_at: u64,
    /// Native decimal precision of the source (e.g. 8)
    pub decimals: u32,
}

impl PriceQuote {
    /// Create a quote
    pub fn new(price: i128, updated_at: u64, decimals: u32) -> Self {
        Self {
            price,
            updated_at,
            decimals,
        }
    }

    /// Age of the quote relative to `now`, saturating at zero for quotes
    /// from the future
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.updated_at)
    }

    /// Whether the quote is within the freshness window
    pub fn is_fresh(&self, now: u64, max_age: u64) -> bool {
        self.age(now) <= max_age
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADAPTER TRAITS
// ═══════════════════════════════════════════════════════════════════════════════

/// External price source adapter.
///
/// Implementations return the latest known quote for a feed; they may fail
/// outright when no quote exists. Staleness and sign checks are the
/// engine's job, not the adapter's.
pub trait PriceFeed {
    /// Latest quote for a feed
    fn latest_price(&self, feed: &FeedId) -> Result<PriceQuote>;
}

/// Time source used for staleness checks
pub trait Clock {
    /// Current unix timestamp in seconds
    fn now(&self) -> u64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}
