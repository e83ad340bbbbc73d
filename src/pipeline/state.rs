// src/pipeline/state.rs

//! Last known catalog state.
//!
//! Owned by exactly one monitor. All three fields change together in
//! [`MonitorState::commit`]; nothing else mutates them after seeding.

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    /// Metadata total seen at the last completed audit
    last_total: u64,
    /// Every code ever observed; never shrinks
    seen_products: HashSet<String>,
    /// Codes from the last completed audit; `None` before the first one
    last_snapshot: Option<HashSet<String>>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state from the startup fetch.
    ///
    /// Leaves `last_snapshot` empty so the first audit reports no removals.
    pub fn seeded(total: u64, codes: HashSet<String>) -> Self {
        Self {
            last_total: total,
            seen_products: codes,
            last_snapshot: None,
        }
    }

    pub fn last_total(&self) -> u64 {
        self.last_total
    }

    pub fn seen_products(&self) -> &HashSet<String> {
        &self.seen_products
    }

    pub fn last_snapshot(&self) -> Option<&HashSet<String>> {
        self.last_snapshot.as_ref()
    }

    pub fn has_seen(&self, code: &str) -> bool {
        self.seen_products.contains(code)
    }

    /// Record a completed audit.
    pub fn commit(&mut self, total: u64, codes: HashSet<String>) {
        self.last_total = total;
        self.seen_products.extend(codes.iter().cloned());
        self.last_snapshot = Some(codes);
    }
}
