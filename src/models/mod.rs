// src/models/mod.rs

//! Domain models for the catalog monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod product;
mod report;

use std::fmt;

use serde::{Deserialize, Serialize};

// Re-export all public types
pub use config::{
    CatalogConfig, Config, LoggingConfig, MonitorConfig, NotifyConfig, SupervisorConfig,
};
pub use product::{CatalogPage, CatalogSnapshot, Pagination, Price, Product, ProductImage};
pub use report::ChangeReport;

/// Chat identifier: a numeric id or an `@channel` handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a delivered chat message.
pub type MessageId = i64;
