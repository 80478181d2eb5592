//! Collateral asset interface.
//!
//! Collateral assets live in an external fungible-asset ledger with standard
//! transfer semantics. The engine checks every transfer's reported outcome
//! instead of assuming success. The in-memory bank is the reference
//! implementation used by tests and simulations.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{Address, Amount, AssetId};

/// The engine-facing surface of the collateral asset ledger
pub trait AssetBank {
    /// Move `amount` of `asset` from `from` to `to`, returning success
    fn transfer(&mut self, asset: &AssetId, from: Address, to: Address, amount: Amount) -> bool;

    /// Balance of an account in an asset
    fn balance_of(&self, asset: &AssetId, who: &Address) -> Amount;
}

/// In-memory multi-asset balance ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryAssetBank {
    balances: HashMap<AssetId, HashMap<Address, Amount>>,
    // Assets whose transfers are made to report failure, for exercising the
    // engine's rollback paths.
    refusing: HashSet<AssetId>,
}

impl InMemoryAssetBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with a balance (test/simulation setup)
    pub fn credit(&mut self, asset: &AssetId, who: Address, amount: Amount) {
        let balance = self
            .balances
            .entry(asset.clone())
            .or_default()
            .entry(who)
            .or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Make transfers of `asset` report failure
    pub fn refuse_transfers(&mut self, asset: &AssetId, refuse: bool) {
        if refuse {
            self.refusing.insert(asset.clone());
        } else {
            self.refusing.remove(asset);
        }
    }

    /// Total of all balances in an asset
    pub fn total_in_circulation(&self, asset: &AssetId) -> Amount {
        self.balances
            .get(asset)
            .map(|accounts| accounts.values().fold(0u128, |acc, &b| acc.saturating_add(b)))
            .unwrap_or(0)
    }
}

impl AssetBank for InMemoryAssetBank {
    fn transfer(&mut self, asset: &AssetId, from: Address, to: Address, amount: Amount) -> bool {
        if self.refusing.contains(asset) {
            return false;
        }
        if from == to {
            return self.balance_of(asset, &from) >= amount;
        }
        let from_balance = self.balance_of(asset, &from);
        if from_balance < amount {
            return false;
        }
        let accounts = self.balances.entry(asset.clone()).or_default();
        if from_balance == amount {
            accounts.remove(&from);
        } else {
            accounts.insert(from, from_balance - amount);
        }
        let to_balance = accounts.entry(to).or_insert(0);
        *to_balance = to_balance.saturating_add(amount);
        true
    }

    fn balance_of(&self, asset: &AssetId, who: &Address) -> Amount {
        self.balances
            .get(asset)
            .and_then(|accounts| accounts.get(who))
            .copied()
            .unwrap_or(0)
    }
}
