//! Error types for the vaultUSD engine.
//!
//! Every error is fatal to the triggering operation: the engine rolls back
//! any partial state change before returning it, and never retries on its
//! own. Retry, if any, is a caller concern.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the vaultUSD engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// An amount argument was zero
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// An asset outside the configured collateral set was referenced
    #[error("Unsupported collateral asset: {0}")]
    UnsupportedAsset(String),

    /// The same asset appeared twice in the construction-time list
    #[error("Duplicate collateral asset: {0}")]
    DuplicateAsset(String),

    /// Construction-time asset/feed list length mismatch
    #[error("Asset/feed list length mismatch: {assets} assets, {feeds} feeds")]
    LengthMismatch {
        /// Number of asset identifiers supplied
        assets: usize,
        /// Number of price-feed identifiers supplied
        feeds: usize,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Ledger Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Not enough deposited collateral for the requested operation
    #[error("Insufficient collateral: required {required}, available {available}")]
    InsufficientCollateral {
        /// Required collateral quantity
        required: u128,
        /// Available collateral quantity
        available: u128,
    },

    /// Attempted to burn more debt than is outstanding
    #[error("Insufficient debt: requested {requested}, outstanding {outstanding}")]
    InsufficientDebt {
        /// Requested burn amount
        requested: u128,
        /// Outstanding debt
        outstanding: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Solvency Errors
    // ═══════════════════════════════════════════════════════════════════

    /// An operation would leave, or left, a position undercollateralized
    #[error("Health factor broken: {ratio}")]
    HealthFactorBroken {
        /// The offending health factor, 18-decimal fixed point
        ratio: u128,
    },

    /// Liquidation attempted on a position that is not undercollateralized
    #[error("Position is healthy and cannot be liquidated")]
    HealthFactorOk,

    /// A liquidation did not strictly improve the target's ratio
    #[error("Liquidation did not improve health factor: {starting} -> {ending}")]
    HealthFactorNotImproved {
        /// Health factor before the liquidation
        starting: u128,
        /// Health factor the liquidation would have produced
        ending: u128,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Oracle Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Price quote is older than the configured freshness window
    #[error("Price is stale: {age}s old, max allowed {max_age}s")]
    StalePrice {
        /// Seconds since the quote was updated
        age: u64,
        /// Maximum allowed age in seconds
        max_age: u64,
    },

    /// Price quote was zero or negative
    #[error("Invalid price: {price}")]
    InvalidPrice {
        /// The offending raw price
        price: i128,
    },

    /// The oracle adapter has no quote for the requested feed
    #[error("Unknown price feed: {0}")]
    UnknownFeed(String),

    // ═══════════════════════════════════════════════════════════════════
    // Collaborator Errors
    // ═══════════════════════════════════════════════════════════════════

    /// An underlying asset or token transfer reported failure
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// The liability token refused to mint
    #[error("Liability token mint failed")]
    MintFailed,

    // ═══════════════════════════════════════════════════════════════════
    // Arithmetic Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Overflow in calculation
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    /// Underflow in calculation
    #[error("Arithmetic underflow in {operation}")]
    Underflow {
        /// Operation that underflowed
        operation: String,
    },

    /// Division by zero in calculation
    #[error("Division by zero in {operation}")]
    DivisionByZero {
        /// Operation that divided by zero
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// A state-mutating entry point was re-entered while another operation
    /// was in progress
    #[error("Engine is locked by another operation")]
    Locked,

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Returns true if this error is recoverable by retrying with different
    /// inputs or at a later time
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InsufficientCollateral { .. }
                | Error::InsufficientDebt { .. }
                | Error::HealthFactorBroken { .. }
                | Error::HealthFactorOk
                | Error::HealthFactorNotImproved { .. }
                | Error::StalePrice { .. }
                | Error::Locked
        )
    }

    /// Returns true if this is a critical error requiring immediate attention
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Error::Overflow { .. }
                | Error::Underflow { .. }
                | Error::DivisionByZero { .. }
                | Error::Serialization(_)
                | Error::Deserialization(_)
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Validation errors: 1xxx
            Error::ZeroAmount => 1001,
            Error::UnsupportedAsset(_) => 1002,
            Error::DuplicateAsset(_) => 1003,
            Error::LengthMismatch { .. } => 1004,

            // Ledger errors: 2xxx
            Error::InsufficientCollateral { .. } => 2001,
            Error::InsufficientDebt { .. } => 2002,

            // Solvency errors: 3xxx
            Error::HealthFactorBroken { .. } => 3001,
            Error::HealthFactorOk => 3002,
            Error::HealthFactorNotImproved { .. } => 3003,

            // Oracle errors: 4xxx
            Error::StalePrice { .. } => 4001,
            Error::InvalidPrice { .. } => 4002,
            Error::UnknownFeed(_) => 4003,

            // Collaborator errors: 5xxx
            Error::TransferFailed(_) => 5001,
            Error::MintFailed => 5002,

            // Arithmetic errors: 6xxx
            Error::Overflow { .. } => 6001,
            Error::Underflow { .. } => 6002,
            Error::DivisionByZero { .. } => 6003,

            // Internal errors: 9xxx
            Error::Locked => 9001,
            Error::Serialization(_) => 9002,
            Error::Deserialization(_) => 9003,
        }
    }
}
