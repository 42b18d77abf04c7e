//! The deposit-claim category.
//!
//! A payer funds a deterministic address derived from the claim payload
//! before anything is registered on the engine; claiming later sweeps the
//! whole balance into the routing flow. Two independent replay guards: the
//! payload's counter is single-use per project, and a swept address can
//! never be swept again.

use std::collections::HashSet;

use sha2::{Digest, Sha256};
use tracing::debug;

use hyperpay_core::constants::DEPOSIT_ADDRESS_TAG;
use hyperpay_core::error::{CategoryError, HyperpayError};
use hyperpay_core::payload::DepositPayload;
use hyperpay_core::types::{Address, ProjectId, SpecId, SplineIndex};

use crate::protocol::{Category, DispatchContext};

/// Derive the pre-funding address for a claim payload.
///
/// Deterministic over `(spec, project, payload bytes)`, so the payer and
/// the claimant compute the same address without coordinating.
pub fn calculated_address(spec_id: SpecId, project_id: ProjectId, payload: &[u8]) -> Address {
    let payload_hash: [u8; 32] = Sha256::digest(payload).into();
    let mut hasher = Sha256::new();
    hasher.update(DEPOSIT_ADDRESS_TAG);
    hasher.update(spec_id.to_le_bytes());
    hasher.update(project_id.to_le_bytes());
    hasher.update(payload_hash);
    Address(hasher.finalize().into())
}

/// Counterfactual pre-funding with replay protection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepositClaim {
    address: Address,
    used_counters: HashSet<(SpecId, ProjectId, u64)>,
    withdrawn_deposits: HashSet<Address>,
}

impl DepositClaim {
    /// Create a deposit-claim handler with `address` as its account.
    pub fn new(address: Address) -> Self {
        Self { address, used_counters: HashSet::new(), withdrawn_deposits: HashSet::new() }
    }

    /// Whether `counter` has already been consumed for this project.
    pub fn is_counter_used(&self, spec_id: SpecId, project_id: ProjectId, counter: u64) -> bool {
        self.used_counters.contains(&(spec_id, project_id, counter))
    }

    /// Whether the deposit at `address` has already been swept.
    pub fn is_withdrawn(&self, address: &Address) -> bool {
        self.withdrawn_deposits.contains(address)
    }
}

impl Category for DepositClaim {
    fn register_user(
        &mut self,
        _ctx: &mut DispatchContext<'_>,
        _spec_id: SpecId,
        _project_id: ProjectId,
        _payload: &[u8],
    ) -> Result<(), HyperpayError> {
        Err(CategoryError::Unsupported("register_user").into())
    }

    fn paycheck(
        &mut self,
        _ctx: &mut DispatchContext<'_>,
        _spec_id: SpecId,
        _project_id: ProjectId,
        _spline_id: SplineIndex,
        _spline_counter: u64,
        _token: &Address,
        _amount: u128,
    ) -> Result<(), HyperpayError> {
        Err(CategoryError::Unsupported("paycheck").into())
    }

    fn get_initial_product(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        spec_id: SpecId,
        project_id: ProjectId,
        payload: &[u8],
    ) -> Result<u128, HyperpayError> {
        let deposit = DepositPayload::decode(payload)?;
        if self.is_counter_used(spec_id, project_id, deposit.counter) {
            return Err(CategoryError::CounterUsed(deposit.counter).into());
        }
        let source = calculated_address(spec_id, project_id, payload);
        if self.is_withdrawn(&source) {
            return Err(CategoryError::DepositWithdrawn(source.to_string()).into());
        }
        let balance = ctx.bank.balance_of(&deposit.resource_token, &source);
        if balance == 0 {
            return Err(CategoryError::EmptyDeposit { address: source.to_string() }.into());
        }
        // Sweep everything actually deposited, not the declared amount.
        ctx.bank.transfer(&deposit.resource_token, &source, &ctx.engine, balance)?;
        self.used_counters.insert((spec_id, project_id, deposit.counter));
        self.withdrawn_deposits.insert(source);
        debug!(
            spec_id,
            project_id,
            counter = deposit.counter,
            source = %source,
            balance,
            "deposit swept"
        );
        Ok(balance)
    }

    fn address(&self) -> Address {
        self.address
    }
}
