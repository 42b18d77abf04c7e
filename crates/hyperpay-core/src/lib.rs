//! # hyperpay-core
//! Foundation types, the resource ledger, and payload codecs for the
//! Hyperpay routing protocol.

pub mod access;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod payload;
pub mod percent;
pub mod token;
pub mod types;
