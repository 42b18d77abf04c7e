//! # hyperpay-categories
//! The category dispatch protocol and its reference handlers.
//!
//! A category is a pluggable recipient: the routing engine hands it
//! registrations, paychecks, and (for the deposit-claim category) initial
//! product requests through the [`Category`] trait. Handlers that do not
//! implement a capability decline it with the dedicated `Unsupported`
//! signal rather than omitting the method.

pub mod cascade;
pub mod claims;
pub mod deposit;
pub mod fanout;
pub mod protocol;

pub use cascade::CascadeLedger;
pub use claims::ClaimsRegistry;
pub use deposit::DepositClaim;
pub use fanout::LedgerFanOut;
pub use protocol::{Category, CategoryHandler, DispatchContext};
