//! Table-driven price feed and manual clock.
//!
//! `FixedPriceFeed` serves quotes from an in-memory table and is the
//! reference feed for tests and simulations; prices move only when told to.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::types::FeedId;
use crate::error::{Error, Result};
use crate::oracle::adapter::{Clock, PriceFeed, PriceQuote};

/// In-memory price table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixedPriceFeed {
    quotes: HashMap<FeedId, PriceQuote>,
}

impl FixedPriceFeed {
    /// Create an empty feed table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the quote for a feed
    pub fn set_price(&mut self, feed: &FeedId, price: i128, updated_at: u64, decimals: u32) {
        self.quotes
            .insert(feed.clone(), PriceQuote::new(price, updated_at, decimals));
    }

    /// Re-stamp an existing quote without changing its price
    pub fn touch(&mut self, feed: &FeedId, updated_at: u64) {
        if let Some(quote) = self.quotes.get_mut(feed) {
            quote.updated_at = updated_at;
        }
    }

    /// Drop a feed from the table
    pub fn remove(&mut self, feed: &FeedId) {
        self.quotes.remove(feed);
    }
}

impl PriceFeed for FixedPriceFeed {
    fn latest_price(&self, feed: &FeedId) -> Result<PriceQuote> {
        self.quotes
            .get(feed)
            .copied()
            .ok_or_else(|| Error::UnknownFeed(feed.to_string()))
    }
}

/// Hand-driven clock for deterministic tests; clones share the same instant
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    /// Create a clock at a fixed instant
    pub fn at(now: u64) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    /// Jump to an instant
    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    /// Advance by a number of seconds
    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}
