//! Position ledger: the system of record for deposited collateral and
//! outstanding debt.
//!
//! A position springs into existence implicitly on first deposit and never
//! needs explicit destruction; a zero-valued record is equivalent to
//! absence. The ledger is exclusively owned and mutated by the engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{Address, Amount, AssetId};
use crate::error::{Error, Result};
use crate::utils::math::{safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// POSITION
// ═══════════════════════════════════════════════════════════════════════════════

/// One user's aggregate of deposited collateral and outstanding debt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Deposited quantity per asset; absent key means zero
    collateral: HashMap<AssetId, Amount>,
    /// Liability units minted against this position
    debt: Amount,
}

impl Position {
    /// Deposited quantity of an asset (zero for absent keys)
    pub fn collateral(&self, asset: &AssetId) -> Amount {
        self.collateral.get(asset).copied().unwrap_or(0)
    }

    /// Outstanding debt
    pub fn debt(&self) -> Amount {
        self.debt
    }

    /// Iterate over non-zero collateral balances
    pub fn balances(&self) -> impl Iterator<Item = (&AssetId, Amount)> {
        self.collateral.iter().map(|(asset, &amount)| (asset, amount))
    }

    /// Whether the position holds no collateral and no debt
    pub fn is_empty(&self) -> bool {
        self.debt == 0 && self.collateral.values().all(|&amount| amount == 0)
    }

    /// Increase a collateral balance
    pub fn credit(&mut self, asset: &AssetId, amount: Amount) -> Result<()> {
        let balance = self.collateral.entry(asset.clone()).or_insert(0);
        *balance = safe_add(*balance, amount)?;
        Ok(())
    }

    /// Decrease a collateral balance; fails without mutating if the balance
    /// is insufficient
    pub fn debit(&mut self, asset: &AssetId, amount: Amount) -> Result<()> {
        let available = self.collateral(asset);
        if amount > available {
            return Err(Error::InsufficientCollateral {
                required: amount,
                available,
            });
        }
        let remaining = available - amount;
        if remaining == 0 {
            self.collateral.remove(asset);
        } else {
            self.collateral.insert(asset.clone(), remaining);
        }
        Ok(())
    }

    /// Increase debt
    pub fn add_debt(&mut self, amount: Amount) -> Result<()> {
        self.debt = safe_add(self.debt, amount)?;
        Ok(())
    }

    /// Decrease debt; fails without mutating if more than outstanding
    pub fn sub_debt(&mut self, amount: Amount) -> Result<()> {
        if amount > self.debt {
            return Err(Error::InsufficientDebt {
                requested: amount,
                outstanding: self.debt,
            });
        }
        self.debt = safe_sub(self.debt, amount)?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POSITION LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// All positions, keyed by user address
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionLedger {
    positions: HashMap<Address, Position>,
}

impl PositionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a position; `None` is indistinguishable from an all-zero
    /// record to callers of `collateral_of`/`debt_of`
    pub fn get(&self, user: &Address) -> Option<&Position> {
        self.positions.get(user)
    }

    /// Mutable access to a position, creating an empty record if absent
    pub fn entry(&mut self, user: Address) -> &mut Position {
        self.positions.entry(user).or_default()
    }

    /// Deposited quantity of an asset for a user
    pub fn collateral_of(&self, user: &Address, asset: &AssetId) -> Amount {
        self.positions
            .get(user)
            .map(|p| p.collateral(asset))
            .unwrap_or(0)
    }

    /// Outstanding debt of a user
    pub fn debt_of(&self, user: &Address) -> Amount {
        self.positions.get(user).map(|p| p.debt()).unwrap_or(0)
    }

    /// Clone a user's position for rollback. A missing position snapshots as
    /// the zero record.
    pub fn snapshot(&self, user: &Address) -> Position {
        self.positions.get(user).cloned().unwrap_or_default()
    }

    /// Restore a previously taken snapshot, dropping the record entirely if
    /// it is all-zero
    pub fn restore(&mut self, user: Address, snapshot: Position) {
        if snapshot.is_empty() {
            self.positions.remove(&user);
        } else {
            self.positions.insert(user, snapshot);
        }
    }

    /// Iterate over all non-empty positions
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Position)> {
        self.positions.iter()
    }

    /// Number of recorded positions
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the ledger has no recorded positions
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sum of all outstanding debt
    pub fn total_debt(&self) -> Amount {
        self.positions
            .values()
            .fold(0, |acc, p| acc.saturating_add(p.debt()))
    }

    /// Serialize the ledger to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a ledger from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }
}
