//! The transactional routing executor.
//!
//! Owns every piece of mutable protocol state: the specification store,
//! project registry, category handlers, token bank, cascade sub-ledger,
//! role grants, and the transient resource ledger. Payment execution and
//! project creation are all-or-nothing: any failure restores the
//! pre-call snapshot, so partial routing is never observable.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, info};

use hyperpay_categories::{Category, CategoryHandler, CascadeLedger, DispatchContext};
use hyperpay_core::access::{Role, RoleRegistry};
use hyperpay_core::constants::ROOT_JUNCTION;
use hyperpay_core::error::{CategoryError, HyperpayError, SpecError};
use hyperpay_core::ledger::ProductLedger;
use hyperpay_core::token::{MemoryTokenBank, TokenBank};
use hyperpay_core::types::{
    Address, CategoryName, JunctionId, ProjectId, ResourceName, SpecId, SplineIndex,
};

use crate::project::ProjectRegistry;
use crate::spec::{Flow, SpecStore, Spline};

/// The state touched by a transactional call, cloned up front and restored
/// on failure.
struct Snapshot {
    projects: ProjectRegistry,
    handlers: HashMap<Address, CategoryHandler>,
    bank: MemoryTokenBank,
    cascade: CascadeLedger,
    ledger: ProductLedger,
}

/// The hyperpayment routing engine.
pub struct HyperpayEngine {
    address: Address,
    specs: SpecStore,
    projects: ProjectRegistry,
    handlers: HashMap<Address, CategoryHandler>,
    bank: MemoryTokenBank,
    cascade: CascadeLedger,
    roles: RoleRegistry,
    ledger: ProductLedger,
}

impl HyperpayEngine {
    /// Create an engine operating the account at `address`.
    ///
    /// The engine grants itself the hyperpayment role: it is the only
    /// caller of paycheck-class category operations.
    pub fn new(address: Address) -> Self {
        let mut roles = RoleRegistry::new();
        roles.grant(address, Role::Hyperpayment);
        Self {
            address,
            specs: SpecStore::new(),
            projects: ProjectRegistry::new(),
            handlers: HashMap::new(),
            bank: MemoryTokenBank::new(),
            cascade: CascadeLedger::new(),
            roles,
            ledger: ProductLedger::new(),
        }
    }

    /// The engine's own account address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The token bank, for balance queries.
    pub fn bank(&self) -> &MemoryTokenBank {
        &self.bank
    }

    /// Mutable token bank access, for funding accounts.
    pub fn bank_mut(&mut self) -> &mut MemoryTokenBank {
        &mut self.bank
    }

    /// The shared cascade sub-ledger, for share balance queries.
    pub fn cascade(&self) -> &CascadeLedger {
        &self.cascade
    }

    /// The handler registered at `address`, if any.
    pub fn handler(&self, address: &Address) -> Option<&CategoryHandler> {
        self.handlers.get(address)
    }

    /// Install a category handler under its own address and authorize it
    /// on the cascade sub-ledger.
    pub fn register_handler(&mut self, handler: CategoryHandler) {
        let address = handler.address();
        self.cascade.authorize(address);
        self.handlers.insert(address, handler);
    }

    // ------------------------------------------------------------------
    // Specification management
    // ------------------------------------------------------------------

    /// Register a new specification shell. See [`SpecStore`].
    pub fn create_specification(
        &mut self,
        url: impl Into<String>,
        categories: Vec<(CategoryName, Address)>,
        resources: Vec<(ResourceName, Address)>,
        spline_count: u64,
    ) -> SpecId {
        self.specs.create_specification(url, categories, resources, spline_count)
    }

    /// Attach a specification's spline list.
    pub fn add_splines(
        &mut self,
        spec_id: SpecId,
        splines: Vec<Spline>,
    ) -> Result<(), HyperpayError> {
        Ok(self.specs.add_splines(spec_id, splines)?)
    }

    /// Attach a specification's flow list.
    pub fn add_flows(&mut self, spec_id: SpecId, flows: Vec<Flow>) -> Result<(), HyperpayError> {
        Ok(self.specs.add_flows(spec_id, flows)?)
    }

    /// Specification ids handed out so far.
    pub fn spec_counter(&self) -> SpecId {
        self.specs.counter()
    }

    /// Project ids handed out so far under `spec_id`.
    pub fn project_counter(&self, spec_id: SpecId) -> ProjectId {
        self.projects.counter(spec_id)
    }

    /// Outstanding resource-ledger products. Zero outside an execution.
    pub fn product_count(&self) -> usize {
        self.ledger.product_count()
    }

    // ------------------------------------------------------------------
    // Transactional operations
    // ------------------------------------------------------------------

    /// Register a project under an active specification, signing each
    /// `(category, payload)` user up with its handler. All-or-nothing.
    pub fn create_project(
        &mut self,
        spec_id: SpecId,
        users: Vec<(CategoryName, Vec<u8>)>,
    ) -> Result<ProjectId, HyperpayError> {
        let snapshot = self.snapshot();
        match self.register_project(spec_id, &users) {
            Ok(project_id) => Ok(project_id),
            Err(e) => {
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Execute one payment: seed the ledger from the initial category,
    /// route every spline's cut to its recipient, and require the ledger
    /// to come out empty. All-or-nothing.
    pub fn hyperpay(
        &mut self,
        spec_id: SpecId,
        project_id: ProjectId,
        payload: &[u8],
    ) -> Result<(), HyperpayError> {
        let snapshot = self.snapshot();
        match self.execute(spec_id, project_id, payload) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Assign the payout address of a claims-registry project.
    pub fn set_withdrawer(
        &mut self,
        spec_id: SpecId,
        project_id: ProjectId,
        category: &str,
        withdrawer: Address,
    ) -> Result<(), HyperpayError> {
        let address = self.specs.get(spec_id)?.category_address(category)?;
        match self.handlers.get_mut(&address) {
            Some(CategoryHandler::ClaimsRegistry(h)) => {
                h.set_withdrawer(spec_id, project_id, withdrawer)
            }
            Some(_) => Err(CategoryError::Unsupported("set_withdrawer").into()),
            None => Err(SpecError::UnknownCategory(category.to_string()).into()),
        }
    }

    /// Withdraw accrued claims-registry payout; `caller` must be the
    /// project's withdrawer.
    pub fn withdraw(
        &mut self,
        spec_id: SpecId,
        project_id: ProjectId,
        category: &str,
        caller: &Address,
        amount: u128,
    ) -> Result<(), HyperpayError> {
        let address = self.specs.get(spec_id)?.category_address(category)?;
        match self.handlers.get_mut(&address) {
            Some(CategoryHandler::ClaimsRegistry(h)) => {
                h.withdraw(&mut self.bank, spec_id, project_id, caller, amount)
            }
            Some(_) => Err(CategoryError::Unsupported("withdraw").into()),
            None => Err(SpecError::UnknownCategory(category.to_string()).into()),
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            projects: self.projects.clone(),
            handlers: self.handlers.clone(),
            bank: self.bank.clone(),
            cascade: self.cascade.clone(),
            ledger: self.ledger.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.projects = snapshot.projects;
        self.handlers = snapshot.handlers;
        self.bank = snapshot.bank;
        self.cascade = snapshot.cascade;
        self.ledger = snapshot.ledger;
    }

    /// Remove-call-reinsert dispatch so the handler and the context's
    /// collaborators can be borrowed mutably at the same time.
    fn dispatch<R>(
        &mut self,
        category: &str,
        address: Address,
        f: impl FnOnce(&mut CategoryHandler, &mut DispatchContext<'_>) -> Result<R, HyperpayError>,
    ) -> Result<R, HyperpayError> {
        let mut handler = self
            .handlers
            .remove(&address)
            .ok_or_else(|| SpecError::UnknownCategory(category.to_string()))?;
        let mut ctx = DispatchContext {
            bank: &mut self.bank,
            cascade: &mut self.cascade,
            roles: &self.roles,
            caller: self.address,
            engine: self.address,
        };
        let result = f(&mut handler, &mut ctx);
        self.handlers.insert(address, handler);
        result
    }

    fn register_project(
        &mut self,
        spec_id: SpecId,
        users: &[(CategoryName, Vec<u8>)],
    ) -> Result<ProjectId, HyperpayError> {
        self.specs.active(spec_id)?;
        let categories: Vec<CategoryName> = users.iter().map(|(name, _)| name.clone()).collect();
        let project_id = self.projects.create(spec_id, categories);
        for (category, payload) in users {
            let address = self.specs.active(spec_id)?.category_address(category)?;
            self.dispatch(category, address, |handler, ctx| {
                handler.register_user(ctx, spec_id, project_id, payload)
            })?;
        }
        info!(spec_id, project_id, users = users.len(), "project created");
        Ok(project_id)
    }

    fn execute(
        &mut self,
        spec_id: SpecId,
        project_id: ProjectId,
        payload: &[u8],
    ) -> Result<(), HyperpayError> {
        let spec = self.specs.active(spec_id)?.clone();
        self.projects.get(spec_id, project_id)?;

        // Seed: the initial spline names the resource and the category
        // that brings it into the flow.
        let initial_spline =
            spec.spline(0).ok_or(SpecError::NoInitialSpline(spec_id))?;
        let initial_flow = spec.flow(0).ok_or(SpecError::NoInitialSpline(spec_id))?;
        let initial_address = spec.category_address(&initial_spline.category)?;
        let amount = self.dispatch(&initial_spline.category, initial_address, |handler, ctx| {
            handler.get_initial_product(ctx, spec_id, project_id, payload)
        })?;
        self.ledger.store_initial_product(&initial_flow.from, amount)?;
        info!(spec_id, project_id, amount, resource = %initial_flow.from, "routing seeded");

        // Worklist traversal. Firing spline `i` activates junction `i`
        // (spline ids double as junction ids in published specifications)
        // as well as its declared after-junction.
        let engine_address = self.address;
        let mut worklist = VecDeque::from([ROOT_JUNCTION]);
        let mut visited: HashSet<JunctionId> = HashSet::new();
        let mut fired: HashSet<SplineIndex> = HashSet::new();
        let mut spline_counter: u64 = 0;
        while let Some(junction) = worklist.pop_front() {
            if !visited.insert(junction) {
                continue;
            }
            for &index in spec.splines_at(junction) {
                if !fired.insert(index) {
                    continue;
                }
                let (Some(spline), Some(flow)) = (spec.spline(index), spec.flow(index)) else {
                    // Activation freezes adjacency over the parallel lists;
                    // an out-of-range index cannot occur.
                    debug_assert!(false, "adjacency index {index} out of range");
                    continue;
                };
                let delivered = self.ledger.split(&flow.from, flow.percentage)?.delivered;
                let token = spec.resource_token(&flow.to)?;
                let category_address = spec.category_address(&spline.category)?;
                self.bank.transfer(&token, &engine_address, &category_address, delivered)?;
                spline_counter += 1;
                self.dispatch(&spline.category, category_address, |handler, ctx| {
                    handler.paycheck(
                        ctx,
                        spec_id,
                        project_id,
                        index,
                        spline_counter,
                        &token,
                        delivered,
                    )
                })?;
                debug!(
                    spec_id,
                    project_id,
                    spline = index,
                    category = %spline.category,
                    percentage = flow.percentage,
                    delivered,
                    "spline fired"
                );
                worklist.push_back(index);
                worklist.push_back(spline.after_junction);
            }
        }

        let unsettled = self.ledger.product_count();
        if unsettled > 0 {
            return Err(SpecError::UnsettledProducts { count: unsettled }.into());
        }
        info!(spec_id, project_id, splines = spline_counter, "routing complete");
        Ok(())
    }
}
