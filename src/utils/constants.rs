//! Protocol constants and magic numbers.
//!
//! All engine-wide constants are defined here for easy auditing and
//! modification.

// ═══════════════════════════════════════════════════════════════════════════════
// FIXED-POINT PRECISION
// ═══════════════════════════════════════════════════════════════════════════════

/// Internal fixed-point decimals for all quantities and values
pub const INTERNAL_DECIMALS: u32 = 18;

/// Scale factor for 18-decimal fixed point (10^18)
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

// ═══════════════════════════════════════════════════════════════════════════════
// SOLVENCY CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Fraction of nominal collateral value counted toward solvency (50%),
/// encoding the 200% target overcollateralization ratio
pub const LIQUIDATION_THRESHOLD: u128 = 50;

/// Divisor for threshold and bonus percentages (100 = 100%)
pub const LIQUIDATION_PRECISION: u128 = 100;

/// Extra collateral awarded to a liquidator, as a percentage of the covered
/// debt's equivalent quantity (10%)
pub const LIQUIDATION_BONUS: u128 = 10;

/// Minimum health factor for a position to be considered solvent
/// (1.0 in 18-decimal fixed point)
pub const MIN_HEALTH_FACTOR: u128 = PRECISION;

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default maximum price staleness in seconds (1 hour)
pub const MAX_PRICE_AGE_SECS: u64 = 3600;

// ═══════════════════════════════════════════════════════════════════════════════
// BOOKKEEPING CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum number of events retained in the in-memory event log
pub const EVENT_LOG_CAPACITY: usize = 1000;
