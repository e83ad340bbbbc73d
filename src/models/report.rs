//! Change report produced by one audit.

use serde::Serialize;

use super::Product;

/// Difference between the previous state and a freshly fetched catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeReport {
    /// Products whose code was never seen before, in fetch order
    pub added: Vec<Product>,

    /// Codes in the previous snapshot that are gone now
    pub removed_count: usize,

    /// Metadata total recorded before this audit
    pub previous_total: u64,

    /// Metadata total that triggered this audit
    pub current_total: u64,

    /// Size of the previous identifier set (current size on a first audit)
    pub previous_count: usize,

    /// Size of the new identifier set
    pub current_count: usize,
}

impl ChangeReport {
    /// Whether the identifier set actually changed.
    pub fn is_reportable(&self) -> bool {
        !self.added.is_empty() || self.removed_count > 0
    }

    pub fn added_count(&self) -> usize {
        self.added.len()
    }
}
