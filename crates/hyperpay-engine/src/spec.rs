//! Specifications and the routing graph.
//!
//! A specification is populated in three one-shot steps: creation (names,
//! category accounts, resource tokens, declared spline count), then the
//! spline list, then the flow list. Once both lists are present and
//! validated the specification becomes active and its junction adjacency
//! index is frozen.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use hyperpay_core::constants::{FULL_PERCENT, ROOT_JUNCTION};
use hyperpay_core::error::SpecError;
use hyperpay_core::types::{
    Address, CategoryName, JunctionId, ResourceName, SpecId, SplineIndex,
};

/// One edge of the routing graph: where it fires, where it leads, and who
/// receives.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Spline {
    /// Junction that must activate before this spline fires.
    pub before_junction: JunctionId,
    /// Junction activated after this spline fires.
    pub after_junction: JunctionId,
    /// Receiving category, by name.
    pub category: CategoryName,
}

/// The value movement of one spline: which resource it splits, what the
/// delivered piece is called, and how much it takes.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Flow {
    /// Resource the percentage is taken from.
    pub from: ResourceName,
    /// Resource the delivered piece is denominated as.
    pub to: ResourceName,
    /// Cut of the original amount, in fixed-point percentage units.
    pub percentage: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SpecStatus {
    Building,
    Active,
}

/// A fully-described routing specification.
///
/// Splines and flows are parallel lists: flow `i` describes what spline
/// `i` moves. Spline 0 is the initial spline — it loops on the root
/// junction at 100% and names the resource the execution is seeded with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Specification {
    /// Human-readable specification document location.
    pub url: String,
    categories: HashMap<CategoryName, Address>,
    resources: HashMap<ResourceName, Address>,
    spline_count: u64,
    splines: Vec<Spline>,
    flows: Vec<Flow>,
    adjacency: HashMap<JunctionId, Vec<SplineIndex>>,
    status: SpecStatus,
}

impl Specification {
    /// Account address of a declared category.
    pub fn category_address(&self, name: &str) -> Result<Address, SpecError> {
        self.categories
            .get(name)
            .copied()
            .ok_or_else(|| SpecError::UnknownCategory(name.to_string()))
    }

    /// Token a declared resource is denominated in.
    pub fn resource_token(&self, name: &str) -> Result<Address, SpecError> {
        self.resources
            .get(name)
            .copied()
            .ok_or_else(|| SpecError::UnknownResource(name.to_string()))
    }

    /// The spline at `index`, if present.
    pub fn spline(&self, index: SplineIndex) -> Option<&Spline> {
        self.splines.get(index as usize)
    }

    /// The flow of the spline at `index`, if present.
    pub fn flow(&self, index: SplineIndex) -> Option<&Flow> {
        self.flows.get(index as usize)
    }

    /// Spline indices firing at `junction`, ascending. Excludes the initial
    /// spline.
    pub fn splines_at(&self, junction: JunctionId) -> &[SplineIndex] {
        self.adjacency.get(&junction).map_or(&[], Vec::as_slice)
    }

    /// Whether both lists are present and the specification is routable.
    pub fn is_active(&self) -> bool {
        self.status == SpecStatus::Active
    }

    fn try_activate(&mut self, spec_id: SpecId) -> Result<(), SpecError> {
        if self.splines.is_empty() || self.flows.is_empty() {
            return Ok(());
        }
        let initial_spline = &self.splines[0];
        let initial_flow = &self.flows[0];
        if initial_spline.before_junction != ROOT_JUNCTION
            || initial_spline.after_junction != ROOT_JUNCTION
            || initial_flow.percentage != FULL_PERCENT
        {
            return Err(SpecError::NoInitialSpline(spec_id));
        }
        for (index, spline) in self.splines.iter().enumerate().skip(1) {
            self.adjacency
                .entry(spline.before_junction)
                .or_default()
                .push(index as SplineIndex);
        }
        for indices in self.adjacency.values_mut() {
            indices.sort_unstable();
        }
        self.status = SpecStatus::Active;
        info!(spec_id, url = %self.url, splines = self.splines.len(), "specification activated");
        Ok(())
    }
}

/// Registry of specifications with a monotonic 1-based id counter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpecStore {
    counter: SpecId,
    specs: HashMap<SpecId, Specification>,
}

impl SpecStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids handed out so far.
    pub fn counter(&self) -> SpecId {
        self.counter
    }

    /// Register a new specification shell. Splines and flows follow via
    /// [`add_splines`](Self::add_splines) and [`add_flows`](Self::add_flows).
    pub fn create_specification(
        &mut self,
        url: impl Into<String>,
        categories: Vec<(CategoryName, Address)>,
        resources: Vec<(ResourceName, Address)>,
        spline_count: u64,
    ) -> SpecId {
        self.counter += 1;
        let spec_id = self.counter;
        self.specs.insert(
            spec_id,
            Specification {
                url: url.into(),
                categories: categories.into_iter().collect(),
                resources: resources.into_iter().collect(),
                spline_count,
                splines: Vec::new(),
                flows: Vec::new(),
                adjacency: HashMap::new(),
                status: SpecStatus::Building,
            },
        );
        spec_id
    }

    /// Attach the spline list, exactly once, with exactly the declared
    /// count; every referenced category must be in the table.
    pub fn add_splines(&mut self, spec_id: SpecId, splines: Vec<Spline>) -> Result<(), SpecError> {
        let spec = self.get_mut(spec_id)?;
        if !spec.splines.is_empty() {
            return Err(SpecError::SplinesAlreadyAdded(spec_id));
        }
        if splines.len() as u64 != spec.spline_count {
            return Err(SpecError::SplineCountMismatch {
                expected: spec.spline_count,
                got: splines.len() as u64,
            });
        }
        for spline in &splines {
            if !spec.categories.contains_key(&spline.category) {
                return Err(SpecError::UnknownCategory(spline.category.clone()));
            }
        }
        spec.splines = splines;
        if let Err(err) = spec.try_activate(spec_id) {
            // A rejected list must not occupy the one-shot slot.
            spec.splines.clear();
            return Err(err);
        }
        Ok(())
    }

    /// Attach the flow list, exactly once, parallel to the spline list;
    /// every referenced resource must be in the table.
    pub fn add_flows(&mut self, spec_id: SpecId, flows: Vec<Flow>) -> Result<(), SpecError> {
        let spec = self.get_mut(spec_id)?;
        if !spec.flows.is_empty() {
            return Err(SpecError::FlowsAlreadyAdded(spec_id));
        }
        if flows.len() as u64 != spec.spline_count {
            return Err(SpecError::SplineCountMismatch {
                expected: spec.spline_count,
                got: flows.len() as u64,
            });
        }
        for flow in &flows {
            for resource in [&flow.from, &flow.to] {
                if !spec.resources.contains_key(resource) {
                    return Err(SpecError::UnknownResource(resource.clone()));
                }
            }
        }
        spec.flows = flows;
        if let Err(err) = spec.try_activate(spec_id) {
            // A rejected list must not occupy the one-shot slot.
            spec.flows.clear();
            return Err(err);
        }
        Ok(())
    }

    /// Look up a specification.
    pub fn get(&self, spec_id: SpecId) -> Result<&Specification, SpecError> {
        self.specs.get(&spec_id).ok_or(SpecError::SpecNotFound(spec_id))
    }

    /// Look up a specification that must be routable.
    pub fn active(&self, spec_id: SpecId) -> Result<&Specification, SpecError> {
        let spec = self.get(spec_id)?;
        if !spec.is_active() {
            return Err(SpecError::SpecNotActive(spec_id));
        }
        Ok(spec)
    }

    fn get_mut(&mut self, spec_id: SpecId) -> Result<&mut Specification, SpecError> {
        self.specs.get_mut(&spec_id).ok_or(SpecError::SpecNotFound(spec_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperpay_core::constants::PERCENT;

    fn addr(seed: u8) -> Address {
        Address([seed; 32])
    }

    fn categories() -> Vec<(CategoryName, Address)> {
        vec![
            ("customer".into(), addr(1)),
            ("business".into(), addr(2)),
            ("environment".into(), addr(3)),
            ("dep".into(), addr(4)),
        ]
    }

    fn resources() -> Vec<(ResourceName, Address)> {
        ["customer", "business", "environment", "dep"]
            .into_iter()
            .map(|name| (name.to_string(), addr(0xEE)))
            .collect()
    }

    fn spline(before: u64, after: u64, category: &str) -> Spline {
        Spline { before_junction: before, after_junction: after, category: category.into() }
    }

    fn flow(from: &str, to: &str, percentage: u64) -> Flow {
        Flow { from: from.into(), to: to.into(), percentage }
    }

    /// The published open-source routing specification: 4 splines over the
    /// customer resource.
    fn open_source_splines() -> Vec<Spline> {
        vec![
            spline(0, 0, "customer"),
            spline(3, 0, "business"),
            spline(0, 0, "environment"),
            spline(0, 2, "dep"),
        ]
    }

    fn open_source_flows() -> Vec<Flow> {
        vec![
            flow("customer", "customer", FULL_PERCENT),
            flow("customer", "business", 80 * PERCENT),
            flow("customer", "environment", PERCENT / 10),
            flow("customer", "dep", 19 * PERCENT + 9 * PERCENT / 10),
        ]
    }

    fn populated_store() -> (SpecStore, SpecId) {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("spec.example/v1", categories(), resources(), 4);
        store.add_splines(spec_id, open_source_splines()).unwrap();
        store.add_flows(spec_id, open_source_flows()).unwrap();
        (store, spec_id)
    }

    // --- creation & activation ---

    #[test]
    fn ids_are_one_based_and_monotonic() {
        let mut store = SpecStore::new();
        assert_eq!(store.counter(), 0);
        let first = store.create_specification("a", categories(), resources(), 4);
        let second = store.create_specification("b", categories(), resources(), 4);
        assert_eq!((first, second), (1, 2));
        assert_eq!(store.counter(), 2);
    }

    #[test]
    fn building_spec_is_not_active() {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("a", categories(), resources(), 4);
        assert!(!store.get(spec_id).unwrap().is_active());
        assert!(matches!(store.active(spec_id), Err(SpecError::SpecNotActive(_))));

        store.add_splines(spec_id, open_source_splines()).unwrap();
        assert!(!store.get(spec_id).unwrap().is_active());
        store.add_flows(spec_id, open_source_flows()).unwrap();
        assert!(store.active(spec_id).is_ok());
    }

    #[test]
    fn flows_may_arrive_before_splines() {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("a", categories(), resources(), 4);
        store.add_flows(spec_id, open_source_flows()).unwrap();
        store.add_splines(spec_id, open_source_splines()).unwrap();
        assert!(store.active(spec_id).is_ok());
    }

    #[test]
    fn missing_spec_reported() {
        let store = SpecStore::new();
        assert!(matches!(store.get(7), Err(SpecError::SpecNotFound(7))));
    }

    // --- validation ---

    #[test]
    fn spline_count_must_match_declaration() {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("a", categories(), resources(), 5);
        let err = store.add_splines(spec_id, open_source_splines()).unwrap_err();
        assert_eq!(err, SpecError::SplineCountMismatch { expected: 5, got: 4 });
    }

    #[test]
    fn splines_are_one_shot() {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("a", categories(), resources(), 4);
        store.add_splines(spec_id, open_source_splines()).unwrap();
        let err = store.add_splines(spec_id, open_source_splines()).unwrap_err();
        assert_eq!(err, SpecError::SplinesAlreadyAdded(spec_id));
    }

    #[test]
    fn flows_are_one_shot() {
        let (mut store, spec_id) = populated_store();
        let err = store.add_flows(spec_id, open_source_flows()).unwrap_err();
        assert_eq!(err, SpecError::FlowsAlreadyAdded(spec_id));
    }

    #[test]
    fn unknown_category_rejected() {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("a", categories(), resources(), 1);
        let err = store.add_splines(spec_id, vec![spline(0, 0, "ghost")]).unwrap_err();
        assert_eq!(err, SpecError::UnknownCategory("ghost".into()));
    }

    #[test]
    fn unknown_resource_rejected() {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("a", categories(), resources(), 1);
        store.add_splines(spec_id, vec![spline(0, 0, "customer")]).unwrap();
        let err = store
            .add_flows(spec_id, vec![flow("customer", "ghost", FULL_PERCENT)])
            .unwrap_err();
        assert_eq!(err, SpecError::UnknownResource("ghost".into()));
    }

    #[test]
    fn first_spline_must_loop_on_root_at_full_percent() {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("a", categories(), resources(), 1);
        store.add_splines(spec_id, vec![spline(0, 0, "customer")]).unwrap();
        let err = store
            .add_flows(spec_id, vec![flow("customer", "customer", 80 * PERCENT)])
            .unwrap_err();
        assert_eq!(err, SpecError::NoInitialSpline(spec_id));
    }

    #[test]
    fn rejected_flow_list_can_be_corrected() {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("a", categories(), resources(), 4);
        store.add_splines(spec_id, open_source_splines()).unwrap();
        let mut bad = open_source_flows();
        bad[0].percentage = 80 * PERCENT;
        let err = store.add_flows(spec_id, bad).unwrap_err();
        assert_eq!(err, SpecError::NoInitialSpline(spec_id));
        // The rejected list does not occupy the slot; a corrected retry
        // goes through and activates.
        store.add_flows(spec_id, open_source_flows()).unwrap();
        assert!(store.active(spec_id).is_ok());
    }

    #[test]
    fn rejected_spline_list_can_be_corrected() {
        let mut store = SpecStore::new();
        let spec_id = store.create_specification("a", categories(), resources(), 4);
        store.add_flows(spec_id, open_source_flows()).unwrap();
        let mut bad = open_source_splines();
        bad[0].after_junction = 5;
        let err = store.add_splines(spec_id, bad).unwrap_err();
        assert_eq!(err, SpecError::NoInitialSpline(spec_id));
        store.add_splines(spec_id, open_source_splines()).unwrap();
        assert!(store.active(spec_id).is_ok());
    }

    // --- graph queries ---

    #[test]
    fn adjacency_excludes_initial_spline_and_sorts() {
        let (store, spec_id) = populated_store();
        let spec = store.active(spec_id).unwrap();
        // Splines 2 (environment) and 3 (dep) fire at the root junction;
        // the initial spline 0 never does.
        assert_eq!(spec.splines_at(0), &[2, 3]);
        // Business (spline 1) waits for junction 3.
        assert_eq!(spec.splines_at(3), &[1]);
        assert_eq!(spec.splines_at(9), &[] as &[SplineIndex]);
    }

    #[test]
    fn lookup_accessors() {
        let (store, spec_id) = populated_store();
        let spec = store.get(spec_id).unwrap();
        assert_eq!(spec.category_address("business").unwrap(), addr(2));
        assert_eq!(spec.resource_token("customer").unwrap(), addr(0xEE));
        assert_eq!(spec.spline(1).unwrap().category, "business");
        assert_eq!(spec.flow(1).unwrap().percentage, 80 * PERCENT);
        assert!(spec.spline(4).is_none());
        assert!(matches!(
            spec.category_address("ghost"),
            Err(SpecError::UnknownCategory(_))
        ));
    }
}
