//! Service layer for the catalog monitor.
//!
//! This module contains the network-facing collaborators:
//! - Single page access (`PageFetcher`, `HttpPageFetcher`)
//! - Full catalog assembly (`CatalogFetcher`)
//! - Chat delivery (`Notifier`, `TelegramNotifier`)
//! - Change webhook (`Webhook`, `HttpWebhook`)

mod catalog;
mod fetcher;
mod notifier;
mod webhook;

pub use catalog::CatalogFetcher;
pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use notifier::{IncomingChat, IncomingMessage, LinkButton, Notifier, TelegramNotifier, Update};
pub use webhook::{HttpWebhook, Webhook, WebhookPayload};
