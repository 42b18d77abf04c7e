//! The claims-registry category.
//!
//! Holds one ownership record per `(spec, project)`: a package URL, the
//! account that registered it, and a payout address. Paychecks accumulate
//! on the record; the designated withdrawer pulls them out of the
//! category's own token account.

use std::collections::HashMap;

use tracing::debug;

use hyperpay_core::access::Role;
use hyperpay_core::error::{AccessError, CategoryError, HyperpayError};
use hyperpay_core::payload::ClaimPayload;
use hyperpay_core::token::TokenBank;
use hyperpay_core::types::{Address, ProjectId, SpecId, SplineIndex};

use crate::protocol::{Category, DispatchContext};

/// One registered project and its accrued payout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimAccount {
    /// Package URL identifying the project.
    pub purl: String,
    /// Account name at the authentication provider.
    pub username: String,
    /// Authentication provider host.
    pub auth_provider: String,
    /// Payout address; [`Address::ZERO`] until assigned.
    pub withdrawer: Address,
    /// Token the accrued amount is denominated in.
    pub token: Address,
    /// Accrued, not yet withdrawn payout.
    pub amount: u128,
}

/// Category handler keyed by `(spec, project)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimsRegistry {
    address: Address,
    accounts: HashMap<(SpecId, ProjectId), ClaimAccount>,
}

impl ClaimsRegistry {
    /// Create a registry paying out of `address`.
    pub fn new(address: Address) -> Self {
        Self { address, accounts: HashMap::new() }
    }

    /// The stored record for a project, if registered.
    pub fn account(&self, spec_id: SpecId, project_id: ProjectId) -> Option<&ClaimAccount> {
        self.accounts.get(&(spec_id, project_id))
    }

    fn account_mut(
        &mut self,
        spec_id: SpecId,
        project_id: ProjectId,
    ) -> Result<&mut ClaimAccount, CategoryError> {
        self.accounts
            .get_mut(&(spec_id, project_id))
            .ok_or(CategoryError::NotRegistered { spec_id, project_id })
    }

    /// Assign the payout address for a registered project.
    pub fn set_withdrawer(
        &mut self,
        spec_id: SpecId,
        project_id: ProjectId,
        withdrawer: Address,
    ) -> Result<(), HyperpayError> {
        let account = self.account_mut(spec_id, project_id)?;
        account.withdrawer = withdrawer;
        Ok(())
    }

    /// Move `amount` of the accrued payout to the withdrawer.
    ///
    /// Only the assigned withdrawer may call; partial withdrawals leave the
    /// remainder accrued.
    pub fn withdraw(
        &mut self,
        bank: &mut dyn TokenBank,
        spec_id: SpecId,
        project_id: ProjectId,
        caller: &Address,
        amount: u128,
    ) -> Result<(), HyperpayError> {
        let source = self.address;
        let account = self.account_mut(spec_id, project_id)?;
        if account.withdrawer.is_zero() || *caller != account.withdrawer {
            return Err(AccessError::Unauthorized {
                caller: caller.to_string(),
                role: Role::Withdrawer.name(),
            }
            .into());
        }
        if amount > account.amount {
            return Err(CategoryError::InsufficientBalance {
                have: account.amount,
                need: amount,
            }
            .into());
        }
        let token = account.token;
        let to = account.withdrawer;
        bank.transfer(&token, &source, &to, amount)?;
        // The decrement cannot fail; a failed transfer leaves the accrual
        // untouched.
        self.account_mut(spec_id, project_id)?.amount -= amount;
        Ok(())
    }

    /// Withdraw the full accrued payout, returning the amount moved.
    pub fn withdraw_all(
        &mut self,
        bank: &mut dyn TokenBank,
        spec_id: SpecId,
        project_id: ProjectId,
        caller: &Address,
    ) -> Result<u128, HyperpayError> {
        let amount = self.account_mut(spec_id, project_id)?.amount;
        self.withdraw(bank, spec_id, project_id, caller, amount)?;
        Ok(amount)
    }
}

impl Category for ClaimsRegistry {
    fn register_user(
        &mut self,
        _ctx: &mut DispatchContext<'_>,
        spec_id: SpecId,
        project_id: ProjectId,
        payload: &[u8],
    ) -> Result<(), HyperpayError> {
        let claim = ClaimPayload::decode(payload)?;
        if self.accounts.contains_key(&(spec_id, project_id)) {
            return Err(CategoryError::AlreadyRegistered { spec_id, project_id }.into());
        }
        debug!(spec_id, project_id, purl = %claim.purl, "claim registered");
        self.accounts.insert(
            (spec_id, project_id),
            ClaimAccount {
                purl: claim.purl,
                username: claim.username,
                auth_provider: claim.auth_provider,
                withdrawer: claim.withdrawer,
                token: Address::ZERO,
                amount: 0,
            },
        );
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
        let account = self.account_mut(spec_id, project_id)?;
        account.amount = account
            .amount
            .checked_add(amount)
            .ok_or(hyperpay_core::error::TokenError::ValueOverflow)?;
        account.token = *token;
        debug!(spec_id, project_id, spline_id, spline_counter, amount, "paycheck accrued");
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
