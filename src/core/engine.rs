//! The engine: position operations, valuation, and solvency enforcement.
//!
//! Every state-mutating operation follows the same three-phase protocol:
//! validate preconditions, apply the ledger change, then perform external
//! calls with the solvency invariant re-established. Any failure unwinds the
//! whole operation; partial application is never observable. Invariant
//! checks run before the external interaction they guard whenever that
//! interaction cannot affect the checked quantity, so every failure path is
//! unwound with custody-side calls only.

use std::sync::Mutex;

use serde::Serialize;

use crate::core::asset::AssetBank;
use crate::core::config::CollateralConfig;
use crate::core::health::{health_factor, is_healthy};
use crate::core::position::{Position, PositionLedger};
use crate::core::token::LiabilityToken;
use crate::core::types::{Address, Amount, AssetId};
use crate::error::{Error, Result};
use crate::events::{EngineEvent, EventLog};
use crate::liquidation::LiquidationOutcome;
use crate::oracle::adapter::{Clock, PriceFeed, PriceQuote, SystemClock};
use crate::utils::constants::{INTERNAL_DECIMALS, PRECISION};
use crate::utils::math::{mul_div, pow10, safe_add};

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// The overcollateralized issuance engine.
///
/// Owns the position ledger and the event log; consumes the oracle, the
/// liability token, and the collateral asset bank through their traits.
/// Methods take `&mut self`: execution is single-threaded and strictly
/// serialized. For shared access behind the engine-wide non-reentrant
/// guard, see [`SharedEngine`].
pub struct Engine<O, T, B> {
    config: CollateralConfig,
    ledger: PositionLedger,
    events: EventLog,
    oracle: O,
    token: T,
    bank: B,
    clock: Box<dyn Clock>,
}

impl<O, T, B> Engine<O, T, B>
where
    O: PriceFeed,
    T: LiabilityToken,
    B: AssetBank,
{
    /// Create an engine with the system wall clock
    pub fn new(config: CollateralConfig, oracle: O, token: T, bank: B) -> Self {
        Self::with_clock(config, oracle, token, bank, Box::new(SystemClock))
    }

    /// Create an engine with an explicit time source
    pub fn with_clock(
        config: CollateralConfig,
        oracle: O,
        token: T,
        bank: B,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            config,
            ledger: PositionLedger::new(),
            events: EventLog::new(),
            oracle,
            token,
            bank,
            clock,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // POSITION OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deposit collateral into the caller's position.
    ///
    /// The ledger is credited before the asset is pulled into custody; a
    /// refused pull unwinds the credit.
    pub fn deposit(&mut self, user: Address, asset: &AssetId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        if !self.config.is_supported(asset) {
            return Err(Error::UnsupportedAsset(asset.to_string()));
        }

        let snapshot = self.ledger.snapshot(&user);
        if let Err(err) = self.ledger.entry(user).credit(asset, amount) {
            self.ledger.restore(user, snapshot);
            return Err(err);
        }

        if !self.bank.transfer(asset, user, Address::ENGINE, amount) {
            self.ledger.restore(user, snapshot);
            tracing::warn!("deposit of {} {} rolled back for {}", amount, asset, user.short());
            return Err(Error::TransferFailed(format!("{} deposit", asset)));
        }

        self.events.record(EngineEvent::CollateralDeposited {
            user,
            asset: asset.clone(),
            amount,
        });
        tracing::debug!("deposited {} {} for {}", amount, asset, user.short());
        Ok(())
    }

    /// Withdraw collateral from the caller's position back to the caller.
    ///
    /// Fails if the position does not hold enough of the asset, or if the
    /// withdrawal would leave the position undercollateralized.
    pub fn withdraw(&mut self, user: Address, asset: &AssetId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }

        let snapshot = self.ledger.snapshot(&user);
        if let Err(err) = self.ledger.entry(user).debit(asset, amount) {
            self.ledger.restore(user, snapshot);
            return Err(err);
        }

        if let Err(err) = self.require_healthy(&user) {
            self.ledger.restore(user, snapshot);
            tracing::warn!("withdrawal of {} {} rolled back for {}: {}", amount, asset, user.short(), err);
            return Err(err);
        }

        if !self.bank.transfer(asset, Address::ENGINE, user, amount) {
            self.ledger.restore(user, snapshot);
            return Err(Error::TransferFailed(format!("{} withdrawal", asset)));
        }

        self.events.record(EngineEvent::CollateralRedeemed {
            from: user,
            to: user,
            asset: asset.clone(),
            amount,
        });
        tracing::debug!("withdrew {} {} for {}", amount, asset, user.short());
        Ok(())
    }

    /// Mint liability tokens against the caller's collateral.
    ///
    /// The debt increase is applied first, the solvency invariant re-checked,
    /// and only then is the token instructed to mint; failure at any step
    /// unwinds the debt increase.
    pub fn mint_debt(&mut self, user: Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }

        let snapshot = self.ledger.snapshot(&user);
        if let Err(err) = self.ledger.entry(user).add_debt(amount) {
            self.ledger.restore(user, snapshot);
            return Err(err);
        }

        if let Err(err) = self.require_healthy(&user) {
            self.ledger.restore(user, snapshot);
            tracing::warn!("mint of {} rolled back for {}: {}", amount, user.short(), err);
            return Err(err);
        }

        if !self.token.mint(user, amount) {
            self.ledger.restore(user, snapshot);
            return Err(Error::MintFailed);
        }

        tracing::debug!("minted {} debt for {}", amount, user.short());
        Ok(())
    }

    /// Repay the caller's own debt by burning liability tokens pulled from
    /// the caller.
    pub fn burn_debt(&mut self, user: Address, amount: Amount) -> Result<()> {
        let snapshot = self.ledger.snapshot(&user);
        self.burn_debt_for(user, user, amount)?;

        // Defense in depth: burning debt can only improve health, but the
        // invariant is re-checked like after every other mutation.
        if let Err(err) = self.require_healthy(&user) {
            self.ledger.restore(user, snapshot);
            if !self.token.mint(user, amount) {
                return Err(Error::MintFailed);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Deposit collateral and mint debt in one operation.
    ///
    /// Solvency is judged only at the end of the sequence; a failing mint
    /// unwinds the deposit leg.
    pub fn deposit_and_mint(
        &mut self,
        user: Address,
        asset: &AssetId,
        collateral_amount: Amount,
        debt_amount: Amount,
    ) -> Result<()> {
        self.deposit(user, asset, collateral_amount)?;
        if let Err(err) = self.mint_debt(user, debt_amount) {
            self.redeem_to(user, user, asset, collateral_amount)?;
            return Err(err);
        }
        Ok(())
    }

    /// Burn debt and withdraw collateral in one operation.
    ///
    /// Executed burn-then-withdraw, with the solvency check applying only at
    /// the end; a failing withdrawal unwinds the burn leg.
    pub fn burn_and_withdraw(
        &mut self,
        user: Address,
        asset: &AssetId,
        collateral_amount: Amount,
        debt_amount: Amount,
    ) -> Result<()> {
        let snapshot = self.ledger.snapshot(&user);
        self.burn_debt_for(user, user, debt_amount)?;
        if let Err(err) = self.withdraw(user, asset, collateral_amount) {
            self.ledger.restore(user, snapshot);
            if !self.token.mint(user, debt_amount) {
                return Err(Error::MintFailed);
            }
            return Err(err);
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL PRIMITIVES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Debit `from`'s collateral and release it from custody to `to`,
    /// without a solvency check. Liquidation seizes through this primitive;
    /// the target's solvency is judged only after its debt is also reduced.
    pub(crate) fn redeem_to(
        &mut self,
        from: Address,
        to: Address,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<()> {
        let snapshot = self.ledger.snapshot(&from);
        if let Err(err) = self.ledger.entry(from).debit(asset, amount) {
            self.ledger.restore(from, snapshot);
            return Err(err);
        }
        if !self.bank.transfer(asset, Address::ENGINE, to, amount) {
            self.ledger.restore(from, snapshot);
            return Err(Error::TransferFailed(format!("{} redemption", asset)));
        }
        self.events.record(EngineEvent::CollateralRedeemed {
            from,
            to,
            asset: asset.clone(),
            amount,
        });
        Ok(())
    }

    /// Burn `amount` of debt attributed to `on_behalf_of`, paid with tokens
    /// pulled from `payer`. The asymmetry is deliberate: liquidation burns
    /// the target's debt while charging the liquidator.
    pub(crate) fn burn_debt_for(
        &mut self,
        on_behalf_of: Address,
        payer: Address,
        amount: Amount,
    ) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }
        let outstanding = self.ledger.debt_of(&on_behalf_of);
        if amount > outstanding {
            return Err(Error::InsufficientDebt {
                requested: amount,
                outstanding,
            });
        }

        if !self.token.transfer_from(payer, Address::ENGINE, amount) {
            return Err(Error::TransferFailed("liability token pull".into()));
        }
        self.token.burn(amount);
        self.ledger.entry(on_behalf_of).sub_debt(amount)?;

        tracing::debug!(
            "burned {} debt of {} paid by {}",
            amount,
            on_behalf_of.short(),
            payer.short()
        );
        Ok(())
    }

    /// Clone a position for rollback across a multi-step operation
    pub(crate) fn snapshot_position(&self, user: &Address) -> Position {
        self.ledger.snapshot(user)
    }

    /// Restore a position snapshot taken with [`Engine::snapshot_position`]
    pub(crate) fn restore_position(&mut self, user: Address, snapshot: Position) {
        self.ledger.restore(user, snapshot);
    }

    /// Fail with `HealthFactorBroken` unless the user's position is solvent
    pub(crate) fn require_healthy(&self, user: &Address) -> Result<()> {
        let factor = self.health_factor_of(user)?;
        if !is_healthy(factor) {
            return Err(Error::HealthFactorBroken { ratio: factor });
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALUATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Unit-of-account value of `amount` of `asset` at the current quote
    pub fn value_of(&self, asset: &AssetId, amount: Amount) -> Result<Amount> {
        let quote = self.quote_for(asset)?;
        let price = Self::normalized_price(&quote)?;
        mul_div(price, amount, PRECISION)
    }

    /// Quantity of `asset` equivalent to a unit-of-account value at the
    /// current quote
    pub fn quantity_from_value(&self, asset: &AssetId, value: Amount) -> Result<Amount> {
        let quote = self.quote_for(asset)?;
        let price = Self::normalized_price(&quote)?;
        mul_div(value, PRECISION, price)
    }

    /// Total unit-of-account value of a user's deposited collateral.
    ///
    /// Never fails for a user with zero deposits: zero balances are skipped
    /// without touching the oracle.
    pub fn total_collateral_value(&self, user: &Address) -> Result<Amount> {
        let position = match self.ledger.get(user) {
            Some(position) => position,
            None => return Ok(0),
        };
        let mut total: Amount = 0;
        for asset in self.config.assets() {
            let quantity = position.collateral(asset);
            if quantity == 0 {
                continue;
            }
            total = safe_add(total, self.value_of(asset, quantity)?)?;
        }
        Ok(total)
    }

    /// Fetch and vet the current quote for an asset's configured feed
    fn quote_for(&self, asset: &AssetId) -> Result<PriceQuote> {
        let feed = self
            .config
            .feed_for(asset)
            .ok_or_else(|| Error::UnsupportedAsset(asset.to_string()))?;
        let quote = self.oracle.latest_price(feed)?;
        if quote.price <= 0 {
            return Err(Error::InvalidPrice { price: quote.price });
        }
        let age = quote.age(self.clock.now());
        let max_age = self.config.max_price_age_secs();
        if age > max_age {
            return Err(Error::StalePrice { age, max_age });
        }
        Ok(quote)
    }

    /// Scale a vetted quote from its native decimals to 18-decimal fixed
    /// point
    fn normalized_price(quote: &PriceQuote) -> Result<Amount> {
        let raw = quote.price as u128;
        if quote.decimals <= INTERNAL_DECIMALS {
            raw.checked_mul(pow10(INTERNAL_DECIMALS - quote.decimals)?)
                .ok_or(Error::Overflow {
                    operation: "price normalization".into(),
                })
        } else {
            Ok(raw / pow10(quote.decimals - INTERNAL_DECIMALS)?)
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Health factor of a user's position. `Amount::MAX` when debt is zero,
    /// even with zero collateral.
    pub fn health_factor_of(&self, user: &Address) -> Result<Amount> {
        let debt = self.ledger.debt_of(user);
        if debt == 0 {
            // Vacuously healthy; the oracle is not consulted.
            return Ok(Amount::MAX);
        }
        let value = self.total_collateral_value(user)?;
        Ok(health_factor(debt, value))
    }

    /// A user's outstanding debt and total collateral value
    pub fn account_information(&self, user: &Address) -> Result<(Amount, Amount)> {
        let debt = self.ledger.debt_of(user);
        let value = self.total_collateral_value(user)?;
        Ok((debt, value))
    }

    /// Deposited quantity of an asset for a user (raw ledger read; never
    /// touches the oracle)
    pub fn collateral_of(&self, user: &Address, asset: &AssetId) -> Amount {
        self.ledger.collateral_of(user, asset)
    }

    /// Outstanding debt of a user (raw ledger read)
    pub fn debt_of(&self, user: &Address) -> Amount {
        self.ledger.debt_of(user)
    }

    /// A copy of the user's position record (zero-valued for absent users)
    pub fn position(&self, user: &Address) -> Position {
        self.ledger.snapshot(user)
    }

    /// Aggregate engine statistics
    pub fn statistics(&self) -> Result<EngineStats> {
        let mut total_collateral_value: Amount = 0;
        let mut undercollateralized = 0usize;
        for (user, position) in self.ledger.iter() {
            let value = self.total_collateral_value(user)?;
            total_collateral_value = safe_add(total_collateral_value, value)?;
            if position.debt() > 0 && !is_healthy(health_factor(position.debt(), value)) {
                undercollateralized += 1;
            }
        }
        Ok(EngineStats {
            positions: self.ledger.len(),
            total_debt: self.ledger.total_debt(),
            total_collateral_value,
            undercollateralized,
        })
    }

    /// The collateral configuration
    pub fn config(&self) -> &CollateralConfig {
        &self.config
    }

    /// The event log
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The oracle adapter
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Mutable access to the oracle adapter
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// The liability token
    pub fn token(&self) -> &T {
        &self.token
    }

    /// Mutable access to the liability token
    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    /// The collateral asset bank
    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Mutable access to the collateral asset bank
    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PERSISTENCE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Serialize the position ledger
    pub fn ledger_snapshot(&self) -> Result<Vec<u8>> {
        self.ledger.to_bytes()
    }

    /// Replace the position ledger from a serialized snapshot
    pub fn restore_ledger(&mut self, bytes: &[u8]) -> Result<()> {
        self.ledger = PositionLedger::from_bytes(bytes)?;
        Ok(())
    }
}

/// Aggregate statistics over all positions
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    /// Number of recorded positions
    pub positions: usize,
    /// Sum of outstanding debt
    pub total_debt: Amount,
    /// Sum of collateral value across all positions
    pub total_collateral_value: Amount,
    /// Number of positions below the solvency bar
    pub undercollateralized: usize,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Mutual-exclusion wrapper around [`Engine`].
///
/// Every entry point acquires the engine-wide lock without blocking and
/// rejects re-entry or contention with [`Error::Locked`]; the lock is
/// released on all exit paths. Intermediate operation states are therefore
/// never observable, and read-only queries see a single consistent snapshot
/// per call.
pub struct SharedEngine<O, T, B> {
    inner: Mutex<Engine<O, T, B>>,
}

impl<O, T, B> SharedEngine<O, T, B>
where
    O: PriceFeed,
    T: LiabilityToken,
    B: AssetBank,
{
    /// Wrap an engine
    pub fn new(engine: Engine<O, T, B>) -> Self {
        Self {
            inner: Mutex::new(engine),
        }
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Engine<O, T, B>>> {
        self.inner.try_lock().map_err(|_| Error::Locked)
    }

    /// See [`Engine::deposit`]
    pub fn deposit(&self, user: Address, asset: &AssetId, amount: Amount) -> Result<()> {
        self.guard()?.deposit(user, asset, amount)
    }

    /// See [`Engine::withdraw`]
    pub fn withdraw(&self, user: Address, asset: &AssetId, amount: Amount) -> Result<()> {
        self.guard()?.withdraw(user, asset, amount)
    }

    /// See [`Engine::mint_debt`]
    pub fn mint_debt(&self, user: Address, amount: Amount) -> Result<()> {
        self.guard()?.mint_debt(user, amount)
    }

    /// See [`Engine::burn_debt`]
    pub fn burn_debt(&self, user: Address, amount: Amount) -> Result<()> {
        self.guard()?.burn_debt(user, amount)
    }

    /// See [`Engine::deposit_and_mint`]
    pub fn deposit_and_mint(
        &self,
        user: Address,
        asset: &AssetId,
        collateral_amount: Amount,
        debt_amount: Amount,
    ) -> Result<()> {
        self.guard()?
            .deposit_and_mint(user, asset, collateral_amount, debt_amount)
    }

    /// See [`Engine::burn_and_withdraw`]
    pub fn burn_and_withdraw(
        &self,
        user: Address,
        asset: &AssetId,
        collateral_amount: Amount,
        debt_amount: Amount,
    ) -> Result<()> {
        self.guard()?
            .burn_and_withdraw(user, asset, collateral_amount, debt_amount)
    }

    /// See [`Engine::liquidate`](crate::liquidation)
    pub fn liquidate(
        &self,
        liquidator: Address,
        asset: &AssetId,
        user: Address,
        debt_to_cover: Amount,
    ) -> Result<LiquidationOutcome> {
        self.guard()?.liquidate(liquidator, asset, user, debt_to_cover)
    }

    /// See [`Engine::health_factor_of`]
    pub fn health_factor_of(&self, user: &Address) -> Result<Amount> {
        self.guard()?.health_factor_of(user)
    }

    /// Run a read-only closure against a consistent engine snapshot
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&Engine<O, T, B>) -> R) -> Result<R> {
        let guard = self.guard()?;
        Ok(f(&guard))
    }

    /// Unwrap the engine
    pub fn into_inner(self) -> Result<Engine<O, T, B>> {
        self.inner.into_inner().map_err(|_| Error::Locked)
    }
}
