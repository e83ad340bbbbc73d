//! Audit guard against fetch failures that look like an empty catalog.
//!
//! A full fetch that yields no products while the metadata announced a
//! nonzero total is treated as a failed audit. Recording it would mark every
//! known item as removed.

use crate::error::{AppError, Result};
use crate::models::CatalogSnapshot;

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardResult {
    /// Products were fetched
    Safe { product_count: usize },
    /// Metadata and fetch agree the catalog is empty
    EmptyCatalog,
    /// Metadata reported items but none were fetched
    EmptyResult { expected: u64 },
}

/// Guard applied before a snapshot may change monitor state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditGuard;

impl AuditGuard {
    pub fn check(expected_total: u64, snapshot: &CatalogSnapshot) -> GuardResult {
        let product_count = snapshot.products.len();
        if product_count > 0 {
            return GuardResult::Safe { product_count };
        }
        if expected_total == 0 {
            return GuardResult::EmptyCatalog;
        }
        GuardResult::EmptyResult {
            expected: expected_total,
        }
    }

    /// Return `Ok` if the snapshot may be recorded.
    pub fn validate(expected_total: u64, snapshot: &CatalogSnapshot) -> Result<()> {
        match Self::check(expected_total, snapshot) {
            GuardResult::Safe { product_count } => {
                if snapshot.page_failures > 0 {
                    log::warn!(
                        "Audit guard: proceeding with {} products, {} of {} pages failed",
                        product_count,
                        snapshot.page_failures,
                        snapshot.page_total
                    );
                }
                Ok(())
            }
            GuardResult::EmptyCatalog => {
                log::info!("Audit guard: catalog reported empty");
                Ok(())
            }
            GuardResult::EmptyResult { expected } => {
                log::error!(
                    "Audit guard: EMPTY RESULT, metadata reported {} items - keeping previous state",
                    expected
                );
                Err(AppError::IncompleteAudit { expected })
            }
        }
    }
}
