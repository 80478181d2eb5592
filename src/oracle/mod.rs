//! Price oracle boundary.
//!
//! The engine consumes prices through the `PriceFeed` trait and enforces its
//! own staleness window on every quote; a stale or non-positive quote fails
//! the consuming operation rather than silently proceeding.

pub mod adapter;
pub mod fixed;

pub use adapter::{Clock, PriceFeed, PriceQuote, SystemClock};
pub use fixed::{FixedPriceFeed, ManualClock};
