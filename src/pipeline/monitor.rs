// src/pipeline/monitor.rs

//! The polling loop.
//!
//! ```text
//! INITIALIZING -> POLLING <-> AUDITING
//! ```
//!
//! Polling probes page 0 every interval. Only a changed total triggers an
//! audit: full fetch, diff, dispatch, then commit. One monitor owns one
//! `MonitorState`; audits never overlap.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::MonitorConfig;
use crate::pipeline::diff::ChangeDetector;
use crate::pipeline::dispatch::{DispatchSummary, NotificationDispatcher};
use crate::pipeline::guard::{AuditGuard, GuardResult};
use crate::pipeline::messages;
use crate::pipeline::state::MonitorState;
use crate::services::CatalogFetcher;

/// Result of one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Page 0 could not be fetched or carried no total
    MetadataUnavailable,
    /// Total unchanged, no audit ran
    Unchanged { total: u64 },
    /// Audit ran, identifier set unchanged; state committed silently
    Settled { total: u64 },
    /// Audit ran and notifications went out
    Reported {
        added: usize,
        removed: usize,
        dispatch: DispatchSummary,
    },
}

pub struct Monitor {
    catalog: CatalogFetcher,
    dispatcher: NotificationDispatcher,
    settings: MonitorConfig,
    state: MonitorState,
}

impl Monitor {
    pub fn new(
        catalog: CatalogFetcher,
        dispatcher: NotificationDispatcher,
        settings: MonitorConfig,
    ) -> Self {
        Self {
            catalog,
            dispatcher,
            settings,
            state: MonitorState::new(),
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Announce readiness and seed state from one full fetch.
    ///
    /// If seeding fails the state stays empty and the first audit reports
    /// every item as added.
    pub async fn initialize(&mut self) {
        sleep_nonzero(self.settings.startup_delay()).await;

        if self.settings.announce_startup {
            self.dispatcher
                .announce(&messages::startup_notice(self.settings.poll_interval()))
                .await;
        }

        self.state = self.seed().await;
        log::info!(
            "Monitor initialized: {} items, total results {}",
            self.state.seen_products().len(),
            self.state.last_total()
        );
    }

    async fn seed(&self) -> MonitorState {
        let Some(first) = self.catalog.fetch_metadata().await else {
            log::warn!("Seed fetch failed; starting with empty state");
            return MonitorState::new();
        };

        let total = first.total_results().unwrap_or(0);
        let snapshot = self.catalog.fetch_remaining(first).await;
        match AuditGuard::check(total, &snapshot) {
            GuardResult::EmptyResult { expected } => {
                log::warn!(
                    "Seed fetch returned no products for {} reported items; starting with empty state",
                    expected
                );
                MonitorState::new()
            }
            _ => MonitorState::seeded(total, snapshot.codes()),
        }
    }

    /// Run one probe and, when the total moved, one audit.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let Some(metadata) = self.catalog.fetch_metadata().await else {
            return Ok(CycleOutcome::MetadataUnavailable);
        };
        let Some(current_total) = metadata.total_results() else {
            log::warn!("Page 0 carried no totalResults; skipping cycle");
            return Ok(CycleOutcome::MetadataUnavailable);
        };

        if !ChangeDetector::needs_audit(&self.state, current_total) {
            return Ok(CycleOutcome::Unchanged {
                total: current_total,
            });
        }

        log::info!(
            "Total changed {} -> {}; auditing catalog",
            self.state.last_total(),
            current_total
        );
        self.audit(current_total).await
    }

    async fn audit(&mut self, current_total: u64) -> Result<CycleOutcome> {
        let snapshot = self.catalog.fetch_all().await;
        let audit = ChangeDetector::detect(&self.state, current_total, &snapshot)?;

        let outcome = if audit.report.is_reportable() {
            let dispatch = self.dispatcher.dispatch(&audit.report).await;
            log::info!(
                "Audit complete: added={}, removed={}, catalog={}",
                audit.report.added_count(),
                audit.report.removed_count,
                audit.report.current_count
            );
            CycleOutcome::Reported {
                added: audit.report.added_count(),
                removed: audit.report.removed_count,
                dispatch,
            }
        } else {
            log::info!(
                "Total moved to {} without identifier changes; state updated",
                current_total
            );
            CycleOutcome::Settled {
                total: current_total,
            }
        };

        audit.commit(&mut self.state);
        Ok(outcome)
    }

    /// Poll forever. Cycle errors are logged and followed by a cooldown.
    pub async fn run(&mut self) {
        loop {
            tokio::time::sleep(self.settings.poll_interval()).await;

            match self.run_cycle().await {
                Ok(CycleOutcome::Unchanged { .. }) | Ok(CycleOutcome::MetadataUnavailable) => {}
                Ok(outcome) => log::debug!("Cycle finished: {:?}", outcome),
                Err(e) => {
                    match e {
                        AppError::IncompleteAudit { .. } => log::warn!("Audit abandoned: {}", e),
                        _ => log::error!("Monitor loop error: {}", e),
                    }
                    tokio::time::sleep(self.settings.error_cooldown()).await;
                }
            }
        }
    }
}

async fn sleep_nonzero(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
