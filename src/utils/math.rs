//! Fixed-point arithmetic with double-width intermediates.
//!
//! All quantities and unit-of-account values are 18-decimal fixed point in
//! `u128`. Products of two such values exceed 128 bits long before they
//! exceed economic plausibility, so every multiply-then-divide goes through
//! a 256-bit intermediate.

use primitive_types::U256;

use crate::error::{Error, Result};

/// Safe addition with overflow check
pub fn safe_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(Error::Overflow {
        operation: format!("{} + {}", a, b),
    })
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(Error::Underflow {
        operation: format!("{} - {}", a, b),
    })
}

/// Computes `(a * b) / d` with a 256-bit intermediate.
///
/// Fails on division by zero or if the result does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, d: u128) -> Result<u128> {
    if d == 0 {
        return Err(Error::DivisionByZero {
            operation: format!("({} * {}) / 0", a, b),
        });
    }
    let result = U256::from(a) * U256::from(b) / U256::from(d);
    if result > U256::from(u128::MAX) {
        return Err(Error::Overflow {
            operation: format!("({} * {}) / {}", a, b, d),
        });
    }
    Ok(result.as_u128())
}

/// Computes `(a * b) / d` with a 256-bit intermediate, saturating to
/// `u128::MAX` on overflow and division by zero.
///
/// Used where a too-large result is semantically "as good as it gets",
/// e.g. health factors of barely indebted positions.
pub fn saturating_mul_div(a: u128, b: u128, d: u128) -> u128 {
    if d == 0 {
        return u128::MAX;
    }
    let result = U256::from(a) * U256::from(b) / U256::from(d);
    if result > U256::from(u128::MAX) {
        u128::MAX
    } else {
        result.as_u128()
    }
}

/// Power of ten as `u128`; fails for exponents past the `u128` range
pub fn pow10(exp: u32) -> Result<u128> {
    10u128.checked_pow(exp).ok_or(Error::Overflow {
        operation: format!("10^{}", exp),
    })
}
