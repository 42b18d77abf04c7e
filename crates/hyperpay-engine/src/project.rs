//! Per-specification project bookkeeping.

use std::collections::HashMap;

use hyperpay_core::error::SpecError;
use hyperpay_core::types::{CategoryName, ProjectId, SpecId};

/// A registered project: which categories were signed up at creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    /// Category names the project registered users with, in caller order.
    pub user_categories: Vec<CategoryName>,
}

/// Projects keyed by `(spec, project)` with per-spec monotonic 1-based
/// counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectRegistry {
    counters: HashMap<SpecId, ProjectId>,
    projects: HashMap<(SpecId, ProjectId), Project>,
}

impl ProjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids handed out so far under `spec_id`.
    pub fn counter(&self, spec_id: SpecId) -> ProjectId {
        *self.counters.get(&spec_id).unwrap_or(&0)
    }

    /// Allocate the next project id under `spec_id` and record it.
    pub fn create(&mut self, spec_id: SpecId, user_categories: Vec<CategoryName>) -> ProjectId {
        let counter = self.counters.entry(spec_id).or_insert(0);
        *counter += 1;
        let project_id = *counter;
        self.projects.insert((spec_id, project_id), Project { user_categories });
        project_id
    }

    /// Look up a project.
    pub fn get(&self, spec_id: SpecId, project_id: ProjectId) -> Result<&Project, SpecError> {
        self.projects
            .get(&(spec_id, project_id))
            .ok_or(SpecError::ProjectNotFound { spec_id, project_id })
    }
}
