//! Change detection between the monitor state and a fresh catalog.
//!
//! Additions are measured against every code ever seen, removals against
//! the previous snapshot only. A first audit never reports removals.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::{CatalogSnapshot, ChangeReport};
use crate::pipeline::guard::AuditGuard;
use crate::pipeline::state::MonitorState;

/// A completed audit awaiting commit.
#[derive(Debug, Clone)]
pub struct Audit {
    pub report: ChangeReport,
    codes: HashSet<String>,
}

impl Audit {
    /// Codes of the fetched catalog.
    pub fn codes(&self) -> &HashSet<String> {
        &self.codes
    }

    /// Apply the audit to `state`, whether or not it is reportable.
    pub fn commit(self, state: &mut MonitorState) -> ChangeReport {
        state.commit(self.report.current_total, self.codes);
        self.report
    }
}

/// Stateless change detector.
pub struct ChangeDetector;

impl ChangeDetector {
    /// Cheap probe: only a differing metadata total warrants a full fetch.
    pub fn needs_audit(state: &MonitorState, current_total: u64) -> bool {
        current_total != state.last_total()
    }

    /// Diff `snapshot` against `state`.
    ///
    /// Fails with `IncompleteAudit` when the fetch came back empty although
    /// the metadata reported items; `state` must then be left alone.
    pub fn detect(
        state: &MonitorState,
        current_total: u64,
        snapshot: &CatalogSnapshot,
    ) -> Result<Audit> {
        AuditGuard::validate(current_total, snapshot)?;

        let codes = snapshot.codes();

        let mut announced = HashSet::new();
        let added = snapshot
            .products
            .iter()
            .filter(|p| {
                p.code()
                    .is_some_and(|code| !state.has_seen(code) && announced.insert(code))
            })
            .cloned()
            .collect();

        let (removed_count, previous_count) = match state.last_snapshot() {
            Some(previous) => (previous.difference(&codes).count(), previous.len()),
            None => (0, codes.len()),
        };

        Ok(Audit {
            report: ChangeReport {
                added,
                removed_count,
                previous_total: state.last_total(),
                current_total,
                previous_count,
                current_count: codes.len(),
            },
            codes,
        })
    }
}
