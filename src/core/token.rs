//! Liability token interface.
//!
//! The vUSD ledger itself is an external collaborator: the engine influences
//! it only through mint/burn/transfer calls and never mutates its balances
//! directly. Only the engine may mint or burn. The in-memory implementation
//! here is the reference used by tests and simulations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{Address, Amount};

// ═══════════════════════════════════════════════════════════════════════════════
// TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// The engine-facing surface of the liability token.
///
/// Transfer-shaped calls report failure with `false` rather than panicking;
/// the engine treats a `false` as a hard rejection of the whole operation.
pub trait LiabilityToken {
    /// Mint `amount` to `to`. Engine-only caller.
    fn mint(&mut self, to: Address, amount: Amount) -> bool;

    /// Destroy `amount` of tokens already held by the engine's custody
    /// account. Engine-only caller; the engine never burns more than it has
    /// pulled.
    fn burn(&mut self, amount: Amount);

    /// Move `amount` from `from` to `to`, returning success
    fn transfer_from(&mut self, from: Address, to: Address, amount: Amount) -> bool;

    /// Balance of an account
    fn balance_of(&self, who: &Address) -> Amount;

    /// Total outstanding supply
    fn total_supply(&self) -> Amount;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY TOKEN
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory vUSD ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryToken {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    // Failure injection for exercising the engine's rollback paths.
    refuse_mint: bool,
    refuse_transfer: bool,
}

impl Default for InMemoryToken {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryToken {
    /// Create a fresh ledger with zero supply
    pub fn new() -> Self {
        Self {
            name: "vaultUSD".to_string(),
            symbol: "vUSD".to_string(),
            total_supply: 0,
            balances: HashMap::new(),
            refuse_mint: false,
            refuse_transfer: false,
        }
    }

    /// Make subsequent mints report failure
    pub fn refuse_mints(&mut self, refuse: bool) {
        self.refuse_mint = refuse;
    }

    /// Make subsequent transfers report failure
    pub fn refuse_transfers(&mut self, refuse: bool) {
        self.refuse_transfer = refuse;
    }

    /// Verify total supply equals the sum of all balances
    pub fn verify_supply_invariant(&self) -> bool {
        let sum = self
            .balances
            .values()
            .fold(0u128, |acc, &b| acc.saturating_add(b));
        sum == self.total_supply
    }
}

impl LiabilityToken for InMemoryToken {
    fn mint(&mut self, to: Address, amount: Amount) -> bool {
        if self.refuse_mint || amount == 0 {
            return false;
        }
        let new_supply = match self.total_supply.checked_add(amount) {
            Some(supply) => supply,
            None => return false,
        };
        let balance = self.balances.entry(to).or_insert(0);
        *balance = match balance.checked_add(amount) {
            Some(b) => b,
            None => return false,
        };
        self.total_supply = new_supply;
        true
    }

    fn burn(&mut self, amount: Amount) {
        let held = self.balance_of(&Address::ENGINE);
        let burned = amount.min(held);
        if burned == held {
            self.balances.remove(&Address::ENGINE);
        } else {
            self.balances.insert(Address::ENGINE, held - burned);
        }
        self.total_supply = self.total_supply.saturating_sub(burned);
    }

    fn transfer_from(&mut self, from: Address, to: Address, amount: Amount) -> bool {
        if self.refuse_transfer {
            return false;
        }
        if from == to {
            return self.balance_of(&from) >= amount;
        }
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return false;
        }
        if from_balance == amount {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, from_balance - amount);
        }
        let to_balance = self.balances.entry(to).or_insert(0);
        *to_balance = to_balance.saturating_add(amount);
        true
    }

    fn balance_of(&self, who: &Address) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new([0x01; 32])
    }

    fn bob() -> Address {
        Address::new([0x02; 32])
    }

    #[test]
    fn test_mint_and_supply() {
        let mut token = InMemoryToken::new();
        assert!(token.mint(alice(), 1000));
        assert_eq!(token.balance_of(&alice()), 1000);
        assert_eq!(token.total_supply(), 1000);
        assert!(token.verify_supply_invariant());
    }

    #[test]
    fn test_mint_zero_fails() {
        let mut token = InMemoryToken::new();
        assert!(!token.mint(alice(), 0));
    }

    #[test]
    fn test_refused_mint() {
        let mut token = InMemoryToken::new();
        token.refuse_mints(true);
        assert!(!token.mint(alice(), 100));
        assert_eq!(token.total_supply(), 0);
    }

    #[test]
    fn test_transfer_from() {
        let mut token = InMemoryToken::new();
        token.mint(alice(), 500);

        assert!(token.transfer_from(alice(), bob(), 200));
        assert_eq!(token.balance_of(&alice()), 300);
        assert_eq!(token.balance_of(&bob()), 200);
        assert!(token.verify_supply_invariant());

        // Insufficient balance reports failure without mutating.
        assert!(!token.transfer_from(alice(), bob(), 301));
        assert_eq!(token.balance_of(&alice()), 300);
    }

    #[test]
    fn test_burn_destroys_engine_holdings() {
        let mut token = InMemoryToken::new();
        token.mint(alice(), 500);
        token.transfer_from(alice(), Address::ENGINE, 500);

        token.burn(200);
        assert_eq!(token.balance_of(&Address::ENGINE), 300);
        assert_eq!(token.total_supply(), 300);
        assert!(token.verify_supply_invariant());
    }

    #[test]
    fn test_burn_caps_at_held_balance() {
        let mut token = InMemoryToken::new();
        token.mint(Address::ENGINE, 100);
        token.burn(1000);
        assert_eq!(token.balance_of(&Address::ENGINE), 0);
        assert_eq!(token.total_supply(), 0);
    }
}
