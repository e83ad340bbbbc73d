//! In-memory doubles for the network collaborators.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::models::{CatalogPage, ChatId, MessageId, Pagination, Price, Product, ProductImage};
use crate::pipeline::UpdateSource;
use crate::services::{LinkButton, Notifier, PageFetcher, Update, Webhook, WebhookPayload};

/// A product with every optional field filled in.
pub fn product(code: &str) -> Product {
    Product {
        code: Some(code.to_string()),
        name: Some(format!("Item {code}")),
        price: Some(Price {
            display_formatted_value: Some("₹499".to_string()),
            formatted_value: None,
        }),
        was_price: None,
        images: vec![ProductImage {
            url: Some(format!("https://img.example.com/{code}.jpg")),
        }],
        url: Some(format!("/p/{code}")),
    }
}

pub fn codes_of(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .filter_map(|p| p.code.clone())
        .collect()
}

struct FakeCatalog {
    products: Vec<Product>,
    reported_total: Option<u64>,
    failing_pages: HashSet<u32>,
    unavailable: bool,
}

/// Serves a mutable in-memory catalog split into fixed-size pages.
pub struct ScriptedFetcher {
    catalog: Mutex<FakeCatalog>,
    page_size: usize,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    issued: Mutex<Vec<(u32, Instant)>>,
}

impl ScriptedFetcher {
    pub fn new(codes: &[&str], page_size: usize) -> Self {
        Self {
            catalog: Mutex::new(FakeCatalog {
                products: codes.iter().map(|c| product(c)).collect(),
                reported_total: None,
                failing_pages: HashSet::new(),
                unavailable: false,
            }),
            page_size: page_size.max(1),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            issued: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_codes(&self, codes: &[&str]) {
        self.set_products(codes.iter().map(|c| product(c)).collect());
    }

    pub fn set_products(&self, products: Vec<Product>) {
        self.catalog.lock().unwrap().products = products;
    }

    /// Override `totalResults` regardless of the served products.
    pub fn set_reported_total(&self, total: Option<u64>) {
        self.catalog.lock().unwrap().reported_total = total;
    }

    pub fn fail_page(&self, page: u32) {
        self.catalog.lock().unwrap().failing_pages.insert(page);
    }

    /// Make every request fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.catalog.lock().unwrap().unavailable = unavailable;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn issued(&self) -> Vec<(u32, Instant)> {
        self.issued.lock().unwrap().clone()
    }

    fn build_page(&self, page: u32) -> Result<CatalogPage> {
        let catalog = self.catalog.lock().unwrap();
        if catalog.unavailable || catalog.failing_pages.contains(&page) {
            return Err(AppError::Status {
                url: "fake://catalog".to_string(),
                status: 503,
            });
        }

        let total = catalog.products.len();
        let total_pages = total.div_ceil(self.page_size).max(1);
        let start = (page as usize * self.page_size).min(total);
        let end = (start + self.page_size).min(total);

        Ok(CatalogPage {
            products: catalog.products[start..end].to_vec(),
            pagination: Pagination {
                total_results: Some(catalog.reported_total.unwrap_or(total as u64)),
                total_pages: Some(total_pages as u32),
                current_page: Some(page),
            },
        })
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_page(&self, page: u32) -> Result<CatalogPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.issued.lock().unwrap().push((page, Instant::now()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.build_page(page)
    }
}

/// A message observed by `RecordingNotifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat: ChatId,
        text: String,
        button: Option<LinkButton>,
    },
    Photo {
        chat: ChatId,
        image_url: String,
        caption: String,
        button: Option<LinkButton>,
    },
    Pin {
        chat: ChatId,
        message: MessageId,
    },
}

/// Records delivered messages; each operation can be made to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    next_id: AtomicI64,
    pub fail_text: AtomicBool,
    pub fail_photo: AtomicBool,
    pub fail_pin: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn photos(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Photo { caption, .. } => Some(caption),
                _ => None,
            })
            .collect()
    }

    pub fn pins(&self) -> Vec<MessageId> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Pin { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) -> MessageId {
        self.sent.lock().unwrap().push(sent);
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(
        &self,
        chat: &ChatId,
        text: &str,
        button: Option<&LinkButton>,
    ) -> Result<MessageId> {
        if self.fail_text.load(Ordering::SeqCst) {
            return Err(AppError::notify("text delivery refused"));
        }
        Ok(self.record(Sent::Text {
            chat: chat.clone(),
            text: text.to_string(),
            button: button.cloned(),
        }))
    }

    async fn send_photo(
        &self,
        chat: &ChatId,
        image_url: &str,
        caption: &str,
        button: Option<&LinkButton>,
    ) -> Result<MessageId> {
        if self.fail_photo.load(Ordering::SeqCst) {
            return Err(AppError::notify("photo delivery refused"));
        }
        Ok(self.record(Sent::Photo {
            chat: chat.clone(),
            image_url: image_url.to_string(),
            caption: caption.to_string(),
            button: button.cloned(),
        }))
    }

    async fn pin(&self, chat: &ChatId, message: MessageId) -> Result<()> {
        if self.fail_pin.load(Ordering::SeqCst) {
            return Err(AppError::notify("not enough rights to pin"));
        }
        self.record(Sent::Pin {
            chat: chat.clone(),
            message,
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingWebhook {
    posted: Mutex<Vec<WebhookPayload>>,
    pub fail: AtomicBool,
}

impl RecordingWebhook {
    pub fn posted(&self) -> Vec<WebhookPayload> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Webhook for RecordingWebhook {
    async fn post(&self, payload: &WebhookPayload) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::notify("webhook timed out"));
        }
        self.posted.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

/// Replays queued `getUpdates` batches; fails once the queue is empty.
#[derive(Default)]
pub struct ScriptedUpdates {
    batches: Mutex<VecDeque<Result<Vec<Update>>>>,
    offsets: Mutex<Vec<Option<i64>>>,
}

impl ScriptedUpdates {
    pub fn push(&self, batch: Result<Vec<Update>>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    /// Offsets of every poll so far.
    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateSource for ScriptedUpdates {
    async fn updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::notify("connection closed")))
    }
}
