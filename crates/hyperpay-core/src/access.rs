//! Capability checks for payment and withdrawal calls.
//!
//! Granting and revoking is role-admin tooling's job; the core only answers
//! "does this caller hold capability C".

use std::collections::HashSet;

use crate::error::AccessError;
use crate::types::Address;

/// A named capability gating a class of calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// May invoke `paycheck`-class operations on category handlers.
    Hyperpayment,
    /// May invoke `withdraw`-class operations.
    Withdrawer,
}

impl Role {
    /// Stable name used in error messages and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Role::Hyperpayment => "hyperpayment",
            Role::Withdrawer => "withdrawer",
        }
    }
}

/// Set of `(holder, role)` grants.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleRegistry {
    grants: HashSet<(Address, Role)>,
}

impl RoleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `role` to `holder`. Idempotent.
    pub fn grant(&mut self, holder: Address, role: Role) {
        self.grants.insert((holder, role));
    }

    /// Revoke `role` from `holder`. No-op if not granted.
    pub fn revoke(&mut self, holder: &Address, role: Role) {
        self.grants.remove(&(*holder, role));
    }

    /// Whether `holder` holds `role`.
    pub fn has_role(&self, holder: &Address, role: Role) -> bool {
        self.grants.contains(&(*holder, role))
    }

    /// Fail with [`AccessError::Unauthorized`] unless `caller` holds `role`.
    pub fn require(&self, caller: &Address, role: Role) -> Result<(), AccessError> {
        if self.has_role(caller, role) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                caller: caller.to_string(),
                role: role.name(),
            })
        }
    }
}
