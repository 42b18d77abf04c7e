//! The shared cascade sub-ledger.
//!
//! Fan-out categories credit named shares here instead of holding balances
//! themselves, so several categories (e.g. "dep" and "environment" in the
//! open-source specification) can pay into one pool of share accounts.
//! Crediting is gated: only explicitly authorized category accounts may
//! write.

use std::collections::{HashMap, HashSet};

use hyperpay_core::error::{AccessError, HyperpayError, TokenError};
use hyperpay_core::types::Address;

/// Balances keyed by `(share name, token)`, credit-gated by an
/// authorized-accounts set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CascadeLedger {
    balances: HashMap<(String, Address), u128>,
    authorized: HashSet<Address>,
}

impl CascadeLedger {
    /// Create an empty ledger with no authorized writers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `account` to credit shares. Idempotent.
    pub fn authorize(&mut self, account: Address) {
        self.authorized.insert(account);
    }

    /// Whether `account` may credit shares.
    pub fn is_authorized(&self, account: &Address) -> bool {
        self.authorized.contains(account)
    }

    /// Balance of a share in `token` units.
    pub fn balance_of(&self, share: &str, token: &Address) -> u128 {
        *self.balances.get(&(share.to_string(), *token)).unwrap_or(&0)
    }

    /// Credit `amount` of `token` to `share` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Unauthorized`] if `caller` is not an authorized
    ///   category account
    /// - [`TokenError::ValueOverflow`] if the share balance would overflow
    pub fn credit(
        &mut self,
        caller: &Address,
        share: &str,
        token: &Address,
        amount: u128,
    ) -> Result<(), HyperpayError> {
        if !self.is_authorized(caller) {
            return Err(AccessError::Unauthorized {
                caller: caller.to_string(),
                role: "cascade",
            }
            .into());
        }
        let balance = self.balances.entry((share.to_string(), *token)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TokenError::ValueOverflow)?;
        Ok(())
    }
}
