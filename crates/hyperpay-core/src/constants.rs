//! Protocol constants. Percentages are in hundredths of a hundredth of a
//! percent (`1% == 10_000`); amounts are in base token units.

/// One percent, in fixed-point percentage units.
pub const PERCENT: u64 = 10_000;

/// One hundred percent (100.0000%). The lifetime percentage budget of any
/// resource within a single routing execution.
pub const FULL_PERCENT: u64 = 100 * PERCENT;

/// Fixed-point multiplier carrying the amount-per-percentage-point quantum
/// without precision loss. Chosen to match 18-decimal token arithmetic.
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// The junction every traversal starts from. The initial spline of a
/// specification loops on this junction.
pub const ROOT_JUNCTION: u64 = 0;

/// Upper bound on share names a single fan-out registration may carry.
pub const MAX_SHARES: usize = 1_000;

/// Domain tag mixed into counterfactual deposit-address derivation.
pub const DEPOSIT_ADDRESS_TAG: &[u8] = b"hyperpay.deposit.v1";
