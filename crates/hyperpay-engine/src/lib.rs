//! # hyperpay-engine
//! The routing engine: specification store, project registry, and the
//! transactional `hyperpay` executor.
//!
//! A specification declares recipient categories, resources with their
//! tokens, and a graph of percentage splits (splines) over junctions.
//! Executing a payment seeds the resource ledger from the initial
//! category, walks the graph delivering each spline's cut to its
//! category, and requires the ledger to come out empty. Any failure
//! rolls the whole execution back.

pub mod engine;
pub mod project;
pub mod spec;

pub use engine::HyperpayEngine;
pub use project::ProjectRegistry;
pub use spec::{Flow, SpecStore, Specification, Spline};
