//! Core protocol types: identifiers, addresses, and ledger products.
//!
//! Amounts use u128 base token units (18-decimal tokens fit comfortably).
//! Percentages use fixed-point hundredth-of-a-hundredth-of-a-percent units
//! (`1% == 10_000`, see [`crate::constants`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic 1-based specification identifier.
pub type SpecId = u64;
/// Per-specification monotonic 1-based project identifier.
pub type ProjectId = u64;
/// Index of a spline within its specification's append order.
pub type SplineIndex = u64;
/// A traversal checkpoint in the routing graph.
pub type JunctionId = u64;
/// Name of a resource-in-flight within a specification.
pub type ResourceName = String;
/// Name of a recipient category within a specification.
pub type CategoryName = String;

/// An opaque 32-byte account identifier.
///
/// Stands in for a platform account address: category handlers, token
/// contracts, withdrawers, and counterfactual deposit slots are all
/// addressed this way.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The zero address. Used as "no withdrawer assigned".
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create an address from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A ledger entry tracking a resource's remaining value during one routing
/// execution.
///
/// Invariant: `amount == per_percentage * left_percentage / SCALE`.
/// `per_percentage` is computed exactly once from the original amount and
/// propagated unchanged through every split, so sequential splits never
/// compound rounding error.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Product {
    /// Remaining value in base token units.
    pub amount: u128,
    /// Remaining percentage of the original amount, in fixed-point units.
    pub left_percentage: u64,
    /// The exact-quantum anchor: original amount represented by one
    /// percentage unit, carried at [`SCALE`](crate::constants::SCALE).
    pub per_percentage: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_zero_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(Address::ZERO, Address::default());
    }

    #[test]
    fn address_nonzero_is_not_zero() {
        assert!(!Address([1; 32]).is_zero());
    }

    #[test]
    fn address_display_hex() {
        let a = Address([0xAB; 32]);
        let s = format!("{a}");
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(&s[0..2], "ab");
    }

    #[test]
    fn address_from_bytes() {
        let bytes = [42u8; 32];
        let a = Address::from_bytes(bytes);
        assert_eq!(a.as_bytes(), &bytes);
        assert_eq!(Address::from(bytes), a);
    }

    #[test]
    fn bincode_round_trip_address() {
        let a = Address([0xCD; 32]);
        let encoded = bincode::encode_to_vec(a, bincode::config::standard()).unwrap();
        let (decoded, _): (Address, usize) =
            bincode::decode_from_slice(&encoded, bincode::config::standard()).unwrap();
        assert_eq!(a, decoded);
    }
}
