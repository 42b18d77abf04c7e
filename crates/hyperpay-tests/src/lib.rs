//! Integration test suite for Hyperpay.
//!
//! This crate carries cross-crate scenarios: the published open-source
//! routing specification end to end, and adversarial attempts to replay
//! claims, skim undelivered remainders, or observe partially-applied
//! state.

pub mod helpers;
