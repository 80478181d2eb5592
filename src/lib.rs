//! # vaultUSD Engine
//!
//! An overcollateralized issuance engine: users lock volatile collateral
//! assets and mint units of the unit-pegged vUSD liability token against
//! them. The engine holds collateral whose market value must exceed
//! outstanding liabilities at all times, and forcibly unwinds
//! undercollateralized positions before insolvency occurs.
//!
//! ## Architecture
//!
//! The crate consists of several core modules:
//!
//! - **Core**: collateral configuration, position ledger, health factor,
//!   position operations, and the collaborator interfaces (liability token,
//!   collateral asset bank)
//! - **Oracle**: the price-feed adapter boundary and staleness handling
//! - **Liquidation**: seizure of collateral from unhealthy positions with a
//!   liquidator bonus
//! - **Events**: observable deposit/redemption records
//!
//! ## Design Principles
//!
//! - **Solvent**: every state-changing operation re-establishes the health
//!   factor invariant or rolls back in full
//! - **Deterministic**: strictly serialized execution, no partial commits
//! - **Modular**: external collaborators consumed through narrow traits
//!
//! ## Example
//!
//! ```rust,ignore
//! use vaultusd::prelude::*;
//!
//! let mut engine = Engine::new(config, oracle, token, bank);
//! engine.deposit(user, &weth, amount)?;
//! engine.mint_debt(user, debt)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod core;
pub mod error;
pub mod events;
pub mod liquidation;
pub mod oracle;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        asset::{AssetBank, InMemoryAssetBank},
        config::CollateralConfig,
        engine::{Engine, EngineStats, SharedEngine},
        health::health_factor,
        position::{Position, PositionLedger},
        token::{InMemoryToken, LiabilityToken},
        types::{Address, Amount, AssetId, FeedId},
    };
    pub use crate::error::{Error, Result};
    pub use crate::events::{EngineEvent, EventLog};
    pub use crate::liquidation::LiquidationOutcome;
    pub use crate::oracle::{
        adapter::{Clock, PriceFeed, PriceQuote, SystemClock},
        fixed::{FixedPriceFeed, ManualClock},
    };
    pub use crate::utils::constants::{MIN_HEALTH_FACTOR, PRECISION};
}

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const ENGINE_NAME: &str = "vaultUSD";
