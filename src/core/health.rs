//! Health factor calculation.
//!
//! The health factor is a dimensionless 18-decimal fixed-point ratio. Only
//! `LIQUIDATION_THRESHOLD` percent of nominal collateral value counts toward
//! solvency, so a ratio of 1.0 corresponds to 200% nominal backing.

use crate::core::types::Amount;
use crate::utils::constants::{
    LIQUIDATION_PRECISION, LIQUIDATION_THRESHOLD, MIN_HEALTH_FACTOR, PRECISION,
};
use crate::utils::math::saturating_mul_div;

/// Compute the health factor of a position from its outstanding debt and the
/// unit-of-account value of its collateral.
///
/// A position with no debt is perfectly healthy by convention, even with no
/// collateral, and maps to `Amount::MAX`.
pub fn health_factor(debt: Amount, collateral_value: Amount) -> Amount {
    if debt == 0 {
        return Amount::MAX;
    }
    let adjusted = saturating_mul_div(collateral_value, LIQUIDATION_THRESHOLD, LIQUIDATION_PRECISION);
    saturating_mul_div(adjusted, PRECISION, debt)
}

/// Whether a health factor clears the solvency bar
pub fn is_healthy(factor: Amount) -> bool {
    factor >= MIN_HEALTH_FACTOR
}
