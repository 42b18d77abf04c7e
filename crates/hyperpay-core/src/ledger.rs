//! The resource ledger: transient per-execution accounting of value in
//! flight.
//!
//! Products are created when a routing execution seeds its initial resource,
//! shrink as splines consume percentage, and are deleted once their full
//! percentage has been taken. A ledger that is non-empty after an execution
//! completes indicates a mis-specified routing graph.

use std::collections::HashMap;

use crate::constants::FULL_PERCENT;
use crate::error::LedgerError;
use crate::percent::{portion, quantum};
use crate::types::{Product, ResourceName};

/// Outcome of splitting a product: the delivered amount, and whether the
/// source product was exhausted (deleted) by the split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitResult {
    /// Base units moved out of the source product.
    pub delivered: u128,
    /// True if the split consumed the product's last percentage unit.
    pub exhausted: bool,
}

/// Transaction-scoped map from resource name to [`Product`].
///
/// Not persistent: one ledger lives for the duration of a single routing
/// execution and must be empty when it completes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductLedger {
    products: HashMap<ResourceName, Product>,
}

impl ProductLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the initial product for a resource at 100% of `amount`.
    ///
    /// This is the only place the per-percentage quantum is computed; every
    /// later split of this resource derives from it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ProductExists`] if an unresolved product with this
    ///   name is already stored
    /// - [`LedgerError::ValueOverflow`] if the quantum cannot be represented
    pub fn store_initial_product(
        &mut self,
        name: &str,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if self.products.contains_key(name) {
            return Err(LedgerError::ProductExists(name.to_string()));
        }
        let per_percentage = quantum(amount)?;
        self.products.insert(
            name.to_string(),
            Product { amount, left_percentage: FULL_PERCENT, per_percentage },
        );
        Ok(())
    }

    /// Insert or overwrite a derived product.
    ///
    /// Used when a split leaves a remainder piece: `per_percentage` must be
    /// propagated unchanged from the parent so the ledger invariant holds
    /// transitively.
    pub fn store_product(
        &mut self,
        name: &str,
        amount: u128,
        left_percentage: u64,
        per_percentage: u128,
    ) {
        self.products.insert(
            name.to_string(),
            Product { amount, left_percentage, per_percentage },
        );
    }

    /// Remove and return a product.
    ///
    /// # Errors
    ///
    /// [`LedgerError::ProductNotFound`] if no product is stored under
    /// `name` — callers must treat this as terminal within one execution
    /// ("nothing left to route" or "already consumed"), not retryable.
    pub fn take_product(&mut self, name: &str) -> Result<Product, LedgerError> {
        self.products
            .remove(name)
            .ok_or_else(|| LedgerError::ProductNotFound(name.to_string()))
    }

    /// Read a product without removing it.
    pub fn get_product(&self, name: &str) -> Option<&Product> {
        self.products.get(name)
    }

    /// Number of outstanding products. Zero outside a routing execution.
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Whether no products are outstanding.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Move `percentage` units out of the named product.
    ///
    /// The delivered amount is `per_percentage * percentage / SCALE`,
    /// derived from the original quantum rather than the shrinking
    /// remainder. The remainder piece is re-stored with its amount
    /// recomputed from the same quantum (keeping the invariant exact), or
    /// deleted when its percentage reaches zero.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ProductNotFound`] if the product is absent
    /// - [`LedgerError::PercentExceeded`] if `percentage` exceeds what the
    ///   product has left (the specification over-commits this resource)
    pub fn split(&mut self, name: &str, percentage: u64) -> Result<SplitResult, LedgerError> {
        let product = self
            .products
            .get(name)
            .ok_or_else(|| LedgerError::ProductNotFound(name.to_string()))?;
        if percentage > product.left_percentage {
            return Err(LedgerError::PercentExceeded {
                resource: name.to_string(),
                requested: percentage,
                left: product.left_percentage,
            });
        }

        let per_percentage = product.per_percentage;
        let delivered = portion(per_percentage, percentage)?;
        let left = product.left_percentage - percentage;

        if left == 0 {
            self.take_product(name)?;
            Ok(SplitResult { delivered, exhausted: true })
        } else {
            let remainder = portion(per_percentage, left)?;
            self.store_product(name, remainder, left, per_percentage);
            Ok(SplitResult { delivered, exhausted: false })
        }
    }
}
