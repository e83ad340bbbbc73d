// src/services/catalog.rs

//! Full catalog fetch.
//!
//! Page 0 doubles as the cheap change probe and the first chunk of a full
//! fetch. The remaining pages are fetched concurrently, bounded by
//! `max_concurrent`, with page `p` waiting `p * stagger` before its request.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::models::{CatalogConfig, CatalogPage, CatalogSnapshot};
use crate::services::PageFetcher;

/// Service assembling complete catalog snapshots.
pub struct CatalogFetcher {
    fetcher: Arc<dyn PageFetcher>,
    max_concurrent: usize,
    stagger: Duration,
}

impl CatalogFetcher {
    /// Create a catalog fetcher with limits from configuration.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &CatalogConfig) -> Self {
        Self::with_limits(fetcher, config.max_concurrent, config.stagger())
    }

    pub fn with_limits(
        fetcher: Arc<dyn PageFetcher>,
        max_concurrent: usize,
        stagger: Duration,
    ) -> Self {
        Self {
            fetcher,
            max_concurrent: max_concurrent.max(1),
            stagger,
        }
    }

    /// Fetch page 0 only.
    ///
    /// `None` means "no information", not "empty catalog".
    pub async fn fetch_metadata(&self) -> Option<CatalogPage> {
        match self.fetcher.fetch_page(0).await {
            Ok(page) => Some(page),
            Err(error) => {
                log::error!("Error fetching page 0: {}", error);
                None
            }
        }
    }

    /// Fetch every page of the catalog.
    ///
    /// Never fails: a failed page 0 yields an empty snapshot and failed later
    /// pages simply contribute nothing.
    pub async fn fetch_all(&self) -> CatalogSnapshot {
        match self.fetch_metadata().await {
            Some(first) => self.fetch_remaining(first).await,
            None => CatalogSnapshot::default(),
        }
    }

    /// Complete a snapshot from an already fetched page 0.
    pub async fn fetch_remaining(&self, first: CatalogPage) -> CatalogSnapshot {
        let total_pages = first.total_pages();
        let mut snapshot = CatalogSnapshot {
            products: first.products,
            page_total: total_pages.max(1) as usize,
            page_failures: 0,
        };

        if total_pages <= 1 {
            return snapshot;
        }

        let mut pages = stream::iter(1..total_pages)
            .map(|page| async move {
                let delay = self.stagger * page;
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                (page, self.fetcher.fetch_page(page).await)
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((page, result)) = pages.next().await {
            match result {
                Ok(fetched) => snapshot.products.extend(fetched.products),
                Err(error) => {
                    snapshot.page_failures += 1;
                    log::warn!("Failed to fetch catalog page {}: {}", page, error);
                }
            }
        }

        log::debug!(
            "Fetched {} products from {} pages ({} failed)",
            snapshot.products.len(),
            snapshot.page_total,
            snapshot.page_failures
        );
        snapshot
    }
}
