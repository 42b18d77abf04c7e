//! Token transfer boundary.
//!
//! The core assumes an external fungible-token facility where every
//! transfer either fully succeeds or fully fails. [`MemoryTokenBank`] is
//! the in-memory implementation used by tests and the CLI; a production
//! host would adapt its own token layer behind the same trait.

use std::collections::HashMap;

use crate::error::TokenError;
use crate::types::Address;

/// Balance bookkeeping for fungible tokens, keyed by `(token, holder)`.
///
/// Not thread-safe — the routing model is strictly serialized, so callers
/// hold exclusive access for the duration of a transaction.
pub trait TokenBank {
    /// Balance of `holder` in `token` units.
    fn balance_of(&self, token: &Address, holder: &Address) -> u128;

    /// Move `amount` of `token` from `from` to `to`, all-or-nothing.
    ///
    /// # Errors
    ///
    /// [`TokenError::InsufficientBalance`] if `from` holds less than
    /// `amount`; no state changes in that case.
    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError>;
}

/// In-memory token bank backed by a `HashMap`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryTokenBank {
    balances: HashMap<(Address, Address), u128>,
}

impl MemoryTokenBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `token` to `to` out of thin air. Test fixture.
    pub fn mint(&mut self, token: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        let balance = self.balances.entry((*token, *to)).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(TokenError::ValueOverflow)?;
        Ok(())
    }
}

impl TokenBank for MemoryTokenBank {
    fn balance_of(&self, token: &Address, holder: &Address) -> u128 {
        *self.balances.get(&(*token, *holder)).unwrap_or(&0)
    }

    fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        if amount == 0 {
            return Ok(());
        }
        let have = self.balance_of(token, from);
        if have < amount {
            return Err(TokenError::InsufficientBalance { have, need: amount });
        }
        // Self-transfer must not double-count.
        if from == to {
            return Ok(());
        }
        self.balances.insert((*token, *from), have - amount);
        let dest = self.balances.entry((*token, *to)).or_insert(0);
        *dest = dest.checked_add(amount).ok_or(TokenError::ValueOverflow)?;
        Ok(())
    }
}
