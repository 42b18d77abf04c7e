//! The category dispatch protocol.
//!
//! Three methods, all optional per handler: registration, paycheck
//! crediting, and initial-product retrieval. The engine dispatches by
//! category name through [`CategoryHandler`], a tagged-variant enum rather
//! than an open trait-object registry, so the whole handler set stays
//! `Clone` for transactional snapshots.

use hyperpay_core::access::RoleRegistry;
use hyperpay_core::error::HyperpayError;
use hyperpay_core::token::TokenBank;
use hyperpay_core::types::{Address, ProjectId, SpecId, SplineIndex};

use crate::cascade::CascadeLedger;
use crate::claims::ClaimsRegistry;
use crate::deposit::DepositClaim;
use crate::fanout::LedgerFanOut;

/// Mutable collaborators a handler may touch during one dispatch.
///
/// Built by the engine per call; the borrow keeps dispatch strictly
/// serialized.
pub struct DispatchContext<'a> {
    /// Token balance bookkeeping.
    pub bank: &'a mut dyn TokenBank,
    /// Shared sub-ledger fan-out handlers credit into.
    pub cascade: &'a mut CascadeLedger,
    /// Capability grants for paycheck-class calls.
    pub roles: &'a RoleRegistry,
    /// Account the current call originates from.
    pub caller: Address,
    /// The engine's own account; swept deposits land here.
    pub engine: Address,
}

/// A recipient handler in a routing specification.
///
/// Implementations may decline any operation with
/// [`CategoryError::Unsupported`](hyperpay_core::error::CategoryError::Unsupported);
/// the engine treats that as a declared non-capability, distinct from a
/// missing reference.
pub trait Category {
    /// Decode `payload` against this category's schema and persist it for
    /// `(spec_id, project_id)`.
    fn register_user(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        spec_id: SpecId,
        project_id: ProjectId,
        payload: &[u8],
    ) -> Result<(), HyperpayError>;

    /// Credit `amount` of `token` toward the project. Accumulating; called
    /// once per fired spline, identified by `(spline_id, spline_counter)`.
    #[allow(clippy::too_many_arguments)]
    fn paycheck(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        spec_id: SpecId,
        project_id: ProjectId,
        spline_id: SplineIndex,
        spline_counter: u64,
        token: &Address,
        amount: u128,
    ) -> Result<(), HyperpayError>;

    /// Bring the initial resource into the routing flow, returning the
    /// swept amount. Only the deposit-claim category implements this.
    fn get_initial_product(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        spec_id: SpecId,
        project_id: ProjectId,
        payload: &[u8],
    ) -> Result<u128, HyperpayError>;

    /// The handler's own account address (receives paycheck transfers).
    fn address(&self) -> Address;
}

/// The reference handler variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryHandler {
    /// Per-project identity/ownership records with withdrawable balances.
    ClaimsRegistry(ClaimsRegistry),
    /// Even sub-distribution across a list of named shares.
    LedgerFanOut(LedgerFanOut),
    /// Counterfactual pre-funding with replay protection.
    DepositClaim(DepositClaim),
}

impl Category for CategoryHandler {
    fn register_user(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        spec_id: SpecId,
        project_id: ProjectId,
        payload: &[u8],
    ) -> Result<(), HyperpayError> {
        match self {
            Self::ClaimsRegistry(h) => h.register_user(ctx, spec_id, project_id, payload),
            Self::LedgerFanOut(h) => h.register_user(ctx, spec_id, project_id, payload),
            Self::DepositClaim(h) => h.register_user(ctx, spec_id, project_id, payload),
        }
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
        match self {
            Self::ClaimsRegistry(h) => {
                h.paycheck(ctx, spec_id, project_id, spline_id, spline_counter, token, amount)
            }
            Self::LedgerFanOut(h) => {
                h.paycheck(ctx, spec_id, project_id, spline_id, spline_counter, token, amount)
            }
            Self::DepositClaim(h) => {
                h.paycheck(ctx, spec_id, project_id, spline_id, spline_counter, token, amount)
            }
        }
    }

    fn get_initial_product(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        spec_id: SpecId,
        project_id: ProjectId,
        payload: &[u8],
    ) -> Result<u128, HyperpayError> {
        match self {
            Self::ClaimsRegistry(h) => h.get_initial_product(ctx, spec_id, project_id, payload),
            Self::LedgerFanOut(h) => h.get_initial_product(ctx, spec_id, project_id, payload),
            Self::DepositClaim(h) => h.get_initial_product(ctx, spec_id, project_id, payload),
        }
    }

    fn address(&self) -> Address {
        match self {
            Self::ClaimsRegistry(h) => h.address(),
            Self::LedgerFanOut(h) => h.address(),
            Self::DepositClaim(h) => h.address(),
        }
    }
}
