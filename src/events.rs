//! Observable engine records.
//!
//! Every successful collateral movement appends a record here: deposits into
//! custody and redemptions out of it (withdrawals and liquidation seizures
//! both redeem, with different recipients). The log is bounded; old records
//! are pruned first.

use serde::{Deserialize, Serialize};

use crate::core::types::{Address, Amount, AssetId};
use crate::error::{Error, Result};
use crate::utils::constants::EVENT_LOG_CAPACITY;

/// A single observable state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Collateral entered engine custody
    CollateralDeposited {
        /// Depositing user
        user: Address,
        /// Deposited asset
        asset: AssetId,
        /// Deposited quantity
        amount: Amount,
    },
    /// Collateral left engine custody
    CollateralRedeemed {
        /// Position the collateral was debited from
        from: Address,
        /// Recipient (the same user on withdrawal, the liquidator on seizure)
        to: Address,
        /// Redeemed asset
        asset: AssetId,
        /// Redeemed quantity
        amount: Amount,
    },
}

impl EngineEvent {
    /// Whether the record involves the given address
    pub fn touches(&self, who: &Address) -> bool {
        match self {
            EngineEvent::CollateralDeposited { user, .. } => user == who,
            EngineEvent::CollateralRedeemed { from, to, .. } => from == who || to == who,
        }
    }
}

/// Bounded in-memory event log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<EngineEvent>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Create a log with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }

    /// Create a log with a custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            capacity,
        }
    }

    /// Append a record, pruning the oldest past capacity
    pub fn record(&mut self, event: EngineEvent) {
        self.events.push(event);
        if self.events.len() > self.capacity {
            let excess = self.events.len() - self.capacity;
            self.events.drain(0..excess);
        }
    }

    /// All retained records, oldest first
    pub fn all(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Records involving a given address
    pub fn for_address(&self, who: &Address) -> Vec<&EngineEvent> {
        self.events.iter().filter(|e| e.touches(who)).collect()
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Export the retained records as a JSON array
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.events).map_err(|e| Error::Serialization(e.to_string()))
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

    fn deposit(user: Address, amount: Amount) -> EngineEvent {
        EngineEvent::CollateralDeposited {
            user,
            asset: AssetId::new("WETH"),
            amount,
        }
    }

    #[test]
    fn test_record_and_query() {
        let mut log = EventLog::new();
        log.record(deposit(alice(), 10));
        log.record(EngineEvent::CollateralRedeemed {
            from: alice(),
            to: bob(),
            asset: AssetId::new("WETH"),
            amount: 4,
        });

        assert_eq!(log.len(), 2);
        assert_eq!(log.for_address(&alice()).len(), 2);
        assert_eq!(log.for_address(&bob()).len(), 1);
    }

    #[test]
    fn test_capacity_prunes_oldest() {
        let mut log = EventLog::with_capacity(2);
        log.record(deposit(alice(), 1));
        log.record(deposit(alice(), 2));
        log.record(deposit(alice(), 3));

        assert_eq!(log.len(), 2);
        assert_eq!(log.all()[0], deposit(alice(), 2));
        assert_eq!(log.all()[1], deposit(alice(), 3));
    }

    #[test]
    fn test_json_export() {
        let mut log = EventLog::new();
        log.record(deposit(alice(), 10));
        let json = log.to_json().unwrap();
        assert!(json.contains("CollateralDeposited"));
        assert!(json.contains("WETH"));
    }
}
