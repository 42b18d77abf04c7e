//! Exact fixed-point percentage arithmetic.
//!
//! The routing engine never computes "X% of whatever remains": every split
//! multiplies the per-percentage quantum (fixed at product creation) by the
//! percentage units being moved. These helpers keep that arithmetic exact
//! for the full u128 amount range without panicking.

use crate::constants::{FULL_PERCENT, SCALE};
use crate::error::LedgerError;

/// Compute `floor(a * b / c)` without intermediate overflow.
///
/// Falls back to the exact decomposition
/// `(a / c) * b + ((a % c) * b) / c` when `a * b` would overflow u128.
/// With `c == SCALE` and `b` a percentage (at most `FULL_PERCENT`), the
/// fallback never overflows for any representable amount.
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128, LedgerError> {
    debug_assert!(c != 0);
    if let Some(product) = a.checked_mul(b) {
        return Ok(product / c);
    }
    let quot = a / c;
    let rem = a % c;
    let high = quot.checked_mul(b).ok_or(LedgerError::ValueOverflow)?;
    let low = rem.checked_mul(b).ok_or(LedgerError::ValueOverflow)? / c;
    high.checked_add(low).ok_or(LedgerError::ValueOverflow)
}

/// The per-percentage quantum of an original amount:
/// `amount * SCALE / FULL_PERCENT`.
///
/// Computed exactly once per resource, when the initial product is stored.
pub fn quantum(amount: u128) -> Result<u128, LedgerError> {
    mul_div(amount, SCALE, FULL_PERCENT as u128)
}

/// The amount delivered by moving `percentage` units of a resource whose
/// quantum is `per_percentage`: `per_percentage * percentage / SCALE`.
pub fn portion(per_percentage: u128, percentage: u64) -> Result<u128, LedgerError> {
    mul_div(per_percentage, percentage as u128, SCALE)
}
