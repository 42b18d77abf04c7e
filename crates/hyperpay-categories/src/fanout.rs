//! The ledger fan-out category.
//!
//! Registers a counted list of share names per `(spec, project)` and
//! splits every paycheck evenly across them, crediting the shared
//! [`CascadeLedger`](crate::cascade::CascadeLedger). Each share receives
//! `floor(amount / n)`; the truncation remainder stays on the category's
//! token account.

use std::collections::HashMap;

use tracing::debug;

use hyperpay_core::access::Role;
use hyperpay_core::constants::MAX_SHARES;
use hyperpay_core::error::{CategoryError, HyperpayError};
use hyperpay_core::payload::SharesPayload;
use hyperpay_core::types::{Address, ProjectId, SpecId, SplineIndex};

use crate::protocol::{Category, DispatchContext};

/// Even sub-distribution across named shares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerFanOut {
    address: Address,
    shares: HashMap<(SpecId, ProjectId), Vec<String>>,
}

impl LedgerFanOut {
    /// Create a fan-out handler holding remainders at `address`.
    pub fn new(address: Address) -> Self {
        Self { address, shares: HashMap::new() }
    }

    /// Number of registered shares for a project; zero if unregistered.
    pub fn share_count(&self, spec_id: SpecId, project_id: ProjectId) -> usize {
        self.shares.get(&(spec_id, project_id)).map_or(0, Vec::len)
    }

    /// The `index`-th share name, 1-based.
    pub fn share_at(
        &self,
        spec_id: SpecId,
        project_id: ProjectId,
        index: usize,
    ) -> Option<&str> {
        let names = self.shares.get(&(spec_id, project_id))?;
        index
            .checked_sub(1)
            .and_then(|i| names.get(i))
            .map(String::as_str)
    }
}

impl Category for LedgerFanOut {
    fn register_user(
        &mut self,
        _ctx: &mut DispatchContext<'_>,
        spec_id: SpecId,
        project_id: ProjectId,
        payload: &[u8],
    ) -> Result<(), HyperpayError> {
        let shares = SharesPayload::decode(payload)?;
        if shares.names.is_empty() {
            return Err(CategoryError::MalformedPayload("empty share list".into()).into());
        }
        if shares.names.len() > MAX_SHARES {
            return Err(CategoryError::TooManyShares {
                got: shares.names.len(),
                max: MAX_SHARES,
            }
            .into());
        }
        if self.shares.contains_key(&(spec_id, project_id)) {
            return Err(CategoryError::AlreadyRegistered { spec_id, project_id }.into());
        }
        debug!(spec_id, project_id, shares = shares.names.len(), "fan-out registered");
        self.shares.insert((spec_id, project_id), shares.names);
        Ok(())
    }

    fn paycheck(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        spec_id: SpecId,
        project_id: ProjectId,
        spline_id: SplineIndex,
        spline_counter: u64,
        token: &Address,
        amount: u128,
    ) -> Result<(), HyperpayError> {
        ctx.roles.require(&ctx.caller, Role::Hyperpayment)?;
        let names = self
            .shares
            .get(&(spec_id, project_id))
            .ok_or(CategoryError::NotRegistered { spec_id, project_id })?;
        // Registration guarantees a non-empty list.
        let per_share = amount / names.len() as u128;
        for name in names {
            ctx.cascade.credit(&self.address, name, token, per_share)?;
        }
        debug!(
            spec_id,
            project_id,
            spline_id,
            spline_counter,
            per_share,
            remainder = amount - per_share * names.len() as u128,
            "paycheck fanned out"
        );
        Ok(())
    }

    fn get_initial_product(
        &mut self,
        _ctx: &mut DispatchContext<'_>,
        _spec_id: SpecId,
        _project_id: ProjectId,
        _payload: &[u8],
    ) -> Result<u128, HyperpayError> {
        Err(CategoryError::Unsupported("get_initial_product").into())
    }

    fn address(&self) -> Address {
        self.address
    }
}
