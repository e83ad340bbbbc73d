//! Catalog data structures as returned by the listing API.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A price block. The API spells the display field with a lowercase `f`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Price {
    #[serde(rename = "displayformattedValue", default)]
    pub display_formatted_value: Option<String>,

    #[serde(rename = "formattedValue", default)]
    pub formatted_value: Option<String>,
}

/// A product image reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProductImage {
    #[serde(default)]
    pub url: Option<String>,
}

/// A single catalog item.
///
/// Every field may be missing from the upstream document. Items without a
/// `code` cannot be tracked and are left out of all set operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Product {
    /// Unique catalog code
    #[serde(default)]
    pub code: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Current price
    #[serde(default)]
    pub price: Option<Price>,

    /// Price before discount
    #[serde(rename = "wasPriceData", default)]
    pub was_price: Option<Price>,

    #[serde(default)]
    pub images: Vec<ProductImage>,

    /// Detail page path, relative to the site origin
    #[serde(default)]
    pub url: Option<String>,
}

impl Product {
    /// Tracking identifier, ignoring blank codes.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref().filter(|c| !c.trim().is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Best available display price.
    pub fn display_price(&self) -> Option<&str> {
        let current = self.price.as_ref().and_then(|p| {
            p.display_formatted_value
                .as_deref()
                .or(p.formatted_value.as_deref())
        });
        current.or_else(|| {
            self.was_price
                .as_ref()
                .and_then(|p| p.display_formatted_value.as_deref())
        })
    }

    /// Price shown in drop alerts: `formattedValue` first.
    pub fn alert_price(&self) -> Option<&str> {
        self.price
            .as_ref()
            .and_then(|p| p.formatted_value.as_deref())
            .or_else(|| self.display_price())
    }

    /// URL of the primary image, if any.
    pub fn image_url(&self) -> Option<&str> {
        self.images
            .first()
            .and_then(|img| img.url.as_deref())
            .filter(|u| !u.is_empty())
    }

    pub fn relative_url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }
}

/// Pagination block of a listing page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total_results: Option<u64>,

    #[serde(default)]
    pub total_pages: Option<u32>,

    #[serde(default)]
    pub current_page: Option<u32>,
}

/// One page of the catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CatalogPage {
    #[serde(default)]
    pub products: Vec<Product>,

    #[serde(default)]
    pub pagination: Pagination,
}

impl CatalogPage {
    /// Total result count, if the page carried one.
    pub fn total_results(&self) -> Option<u64> {
        self.pagination.total_results
    }

    /// Total page count. A missing value means a single page.
    pub fn total_pages(&self) -> u32 {
        self.pagination.total_pages.unwrap_or(1)
    }
}

/// All products assembled from one fetch cycle.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// Products in arrival order (page 0 first, then completion order)
    pub products: Vec<Product>,
    /// Number of pages the listing announced
    pub page_total: usize,
    /// Pages that failed and contributed nothing
    pub page_failures: usize,
}

impl CatalogSnapshot {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct identifiers present in this snapshot.
    pub fn codes(&self) -> HashSet<String> {
        self.products
            .iter()
            .filter_map(Product::code)
            .map(str::to_string)
            .collect()
    }
}
