//! Error types for the Hyperpay protocol.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("product already stored: {0}")] ProductExists(String),
    #[error("product not found or already taken: {0}")] ProductNotFound(String),
    #[error("percentage exceeds remainder of {resource}: requested {requested}, left {left}")]
    PercentExceeded { resource: String, requested: u64, left: u64 },
    #[error("value overflow")] ValueOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("specification not found: {0}")] SpecNotFound(u64),
    #[error("project not found: spec {spec_id}, project {project_id}")]
    ProjectNotFound { spec_id: u64, project_id: u64 },
    #[error("spline count mismatch: declared {expected}, got {got}")]
    SplineCountMismatch { expected: u64, got: u64 },
    #[error("unknown category: {0}")] UnknownCategory(String),
    #[error("unknown resource: {0}")] UnknownResource(String),
    #[error("splines already added to specification {0}")] SplinesAlreadyAdded(u64),
    #[error("flows already added to specification {0}")] FlowsAlreadyAdded(u64),
    #[error("specification {0} is still building")] SpecNotActive(u64),
    #[error("specification {0} has no initial spline")] NoInitialSpline(u64),
    #[error("{count} products left unsettled after routing")] UnsettledProducts { count: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    #[error("not implemented: {0}")] Unsupported(&'static str),
    #[error("malformed payload: {0}")] MalformedPayload(String),
    #[error("replay detected: counter {0} already used")] CounterUsed(u64),
    #[error("replay detected: deposit {0} already withdrawn")] DepositWithdrawn(String),
    #[error("no deposit at {address}")] EmptyDeposit { address: String },
    #[error("not registered: spec {spec_id}, project {project_id}")]
    NotRegistered { spec_id: u64, project_id: u64 },
    #[error("already registered: spec {spec_id}, project {project_id}")]
    AlreadyRegistered { spec_id: u64, project_id: u64 },
    #[error("not enough tokens: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("too many shares: {got} > {max}")] TooManyShares { got: usize, max: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("value overflow")] ValueOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("caller {caller} does not hold the {role} role")]
    Unauthorized { caller: String, role: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HyperpayError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Spec(#[from] SpecError),
    #[error(transparent)] Category(#[from] CategoryError),
    #[error(transparent)] Token(#[from] TokenError),
    #[error(transparent)] Access(#[from] AccessError),
}

impl HyperpayError {
    /// Whether this failure is the dedicated "category declines the
    /// operation" signal, as opposed to a missing reference.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, HyperpayError::Category(CategoryError::Unsupported(_)))
    }
}
