//! Liquidation engine.
//!
//! Liquidation composes the engine's redemption and burn primitives under
//! relaxed caller authorization: anyone holding liability tokens may cover
//! debt of an undercollateralized position and seize the equivalent
//! collateral plus a bonus. A liquidation that would not strictly improve
//! the target's health is rejected outright.
//!
//! Known accepted limitation: at or below 100% collateralization the bonus
//! cannot be fully funded and liquidation economics break down; such
//! attempts fail the strict-improvement gate. This is deliberate and not to
//! be patched with new economic rules.

use serde::{Deserialize, Serialize};

use crate::core::asset::AssetBank;
use crate::core::engine::Engine;
use crate::core::health::{health_factor, is_healthy};
use crate::core::token::LiabilityToken;
use crate::core::types::{Address, Amount, AssetId};
use crate::error::{Error, Result};
use crate::oracle::adapter::PriceFeed;
use crate::utils::constants::{LIQUIDATION_BONUS, LIQUIDATION_PRECISION};
use crate::utils::math::{mul_div, safe_add};

/// Record of a completed liquidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    /// The liquidated position's owner
    pub user: Address,
    /// The caller who covered the debt
    pub liquidator: Address,
    /// The seized collateral asset
    pub asset: AssetId,
    /// Debt covered, in liability units
    pub debt_covered: Amount,
    /// Total collateral quantity seized (base plus bonus)
    pub collateral_seized: Amount,
    /// Bonus portion of the seizure
    pub bonus_quantity: Amount,
    /// Target's health factor before the liquidation
    pub starting_health: Amount,
    /// Target's health factor after the liquidation
    pub ending_health: Amount,
}

impl<O, T, B> Engine<O, T, B>
where
    O: PriceFeed,
    T: LiabilityToken,
    B: AssetBank,
{
    /// Seize collateral from an undercollateralized position.
    ///
    /// Covers `debt_to_cover` of `user`'s debt with tokens pulled from
    /// `liquidator`, and releases the equivalent quantity of `asset` plus a
    /// bonus to `liquidator`. The target's solvency is
    /// deliberately not re-checked between the seizure and the debt
    /// reduction; only the combined outcome is judged, and it must strictly
    /// improve the target's health.
    pub fn liquidate(
        &mut self,
        liquidator: Address,
        asset: &AssetId,
        user: Address,
        debt_to_cover: Amount,
    ) -> Result<LiquidationOutcome> {
        if debt_to_cover == 0 {
            return Err(Error::ZeroAmount);
        }

        let starting_health = self.health_factor_of(&user)?;
        if is_healthy(starting_health) {
            return Err(Error::HealthFactorOk);
        }

        let outstanding = self.debt_of(&user);
        if debt_to_cover > outstanding {
            return Err(Error::InsufficientDebt {
                requested: debt_to_cover,
                outstanding,
            });
        }

        let base_quantity = self.quantity_from_value(asset, debt_to_cover)?;
        let bonus_quantity = mul_div(base_quantity, LIQUIDATION_BONUS, LIQUIDATION_PRECISION)?;
        let collateral_seized = safe_add(base_quantity, bonus_quantity)?;

        let available = self.collateral_of(&user, asset);
        if collateral_seized > available {
            return Err(Error::InsufficientCollateral {
                required: collateral_seized,
                available,
            });
        }

        // The outcome is fully determined by current prices and balances, so
        // the post-liquidation state is judged before anything moves and
        // every rejection rolls back trivially.
        let seized_value = self.value_of(asset, collateral_seized)?;
        let remaining_value = self
            .total_collateral_value(&user)?
            .saturating_sub(seized_value);
        let ending_health = health_factor(outstanding - debt_to_cover, remaining_value);
        if ending_health <= starting_health {
            return Err(Error::HealthFactorNotImproved {
                starting: starting_health,
                ending: ending_health,
            });
        }

        // The liquidator may hold debt of their own. Their position is not
        // touched by the operation, except when they liquidate themselves,
        // in which case the projected post-state is what must be solvent.
        let liquidator_health = if liquidator == user {
            ending_health
        } else {
            self.health_factor_of(&liquidator)?
        };
        if !is_healthy(liquidator_health) {
            return Err(Error::HealthFactorBroken {
                ratio: liquidator_health,
            });
        }

        // Interactions. The burn leg runs first because its only fallible
        // step is the token pull; a later custody refusal is then unwound
        // with engine-side calls alone.
        let snapshot = self.snapshot_position(&user);
        self.burn_debt_for(user, liquidator, debt_to_cover)?;
        if let Err(err) = self.redeem_to(user, liquidator, asset, collateral_seized) {
            self.restore_position(user, snapshot);
            if !self.token_mut().mint(liquidator, debt_to_cover) {
                return Err(Error::MintFailed);
            }
            return Err(err);
        }

        tracing::info!(
            "liquidated {} of {} debt: {} seized {} {} ({} -> {})",
            debt_to_cover,
            user.short(),
            liquidator.short(),
            collateral_seized,
            asset,
            starting_health,
            ending_health
        );

        Ok(LiquidationOutcome {
            user,
            liquidator,
            asset: asset.clone(),
            debt_covered: debt_to_cover,
            collateral_seized,
            bonus_quantity,
            starting_health,
            ending_health,
        })
    }
}
