// src/pipeline/dispatch.rs

//! Notification dispatch for reportable audits.
//!
//! Three independent, best-effort steps: one alert per added product, the
//! webhook for large catalogs, and a pinned summary. A failure in one step
//! is logged and never stops the others.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::{ChangeReport, ChatId, MessageId, Product};
use crate::pipeline::messages;
use crate::services::{Notifier, Webhook, WebhookPayload};

/// What happened to the webhook step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WebhookOutcome {
    #[default]
    Skipped,
    Delivered,
    Failed,
}

/// Per-step results of one dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub alerts_sent: usize,
    pub alert_failures: usize,
    pub webhook: WebhookOutcome,
    pub summary_sent: bool,
    pub pinned: bool,
}

/// Send a product as a photo when it has an image, as text otherwise.
pub async fn send_product(
    notifier: &dyn Notifier,
    chat: &ChatId,
    base_origin: &str,
    product: &Product,
    caption: &str,
) -> Result<MessageId> {
    let button = messages::shop_button(base_origin, product);
    match product.image_url() {
        Some(image) => {
            notifier
                .send_photo(chat, image, caption, Some(&button))
                .await
        }
        None => notifier.send_text(chat, caption, Some(&button)).await,
    }
}

pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    chat: Option<ChatId>,
    base_origin: String,
    webhook: Option<Arc<dyn Webhook>>,
    webhook_threshold: usize,
}

impl NotificationDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        chat: Option<ChatId>,
        base_origin: impl Into<String>,
    ) -> Self {
        Self {
            notifier,
            chat,
            base_origin: base_origin.into(),
            webhook: None,
            webhook_threshold: usize::MAX,
        }
    }

    /// Post to `webhook` when the catalog holds at least `threshold` items.
    pub fn with_webhook(mut self, webhook: Arc<dyn Webhook>, threshold: usize) -> Self {
        self.webhook = Some(webhook);
        self.webhook_threshold = threshold;
        self
    }

    /// Send a free-form notice to the operator chat, logging failures.
    pub async fn announce(&self, text: &str) -> bool {
        let Some(chat) = &self.chat else {
            return false;
        };
        match self.notifier.send_text(chat, text, None).await {
            Ok(_) => true,
            Err(e) => {
                log::error!("Could not send notice to {}: {}", chat, e);
                false
            }
        }
    }

    /// Notify about a reportable change.
    pub async fn dispatch(&self, report: &ChangeReport) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        match &self.chat {
            Some(chat) => {
                for product in &report.added {
                    let caption = messages::drop_alert(product);
                    let sent = send_product(
                        self.notifier.as_ref(),
                        chat,
                        &self.base_origin,
                        product,
                        &caption,
                    )
                    .await;
                    match sent {
                        Ok(_) => summary.alerts_sent += 1,
                        Err(e) => {
                            summary.alert_failures += 1;
                            log::error!(
                                "Failed to send drop alert for {}: {}",
                                product.code().unwrap_or("?"),
                                e
                            );
                        }
                    }
                }
            }
            None => log::debug!(
                "No operator chat configured; {} alerts not sent",
                report.added_count()
            ),
        }

        summary.webhook = self.post_webhook(report).await;

        if let Some(chat) = &self.chat {
            match self
                .notifier
                .send_text(chat, &messages::summary(report), None)
                .await
            {
                Ok(message) => {
                    summary.summary_sent = true;
                    summary.pinned = self.notifier.pin(chat, message).await.is_ok();
                }
                Err(e) => log::error!("Failed to send summary: {}", e),
            }
        }

        summary
    }

    async fn post_webhook(&self, report: &ChangeReport) -> WebhookOutcome {
        let Some(webhook) = &self.webhook else {
            return WebhookOutcome::Skipped;
        };
        if report.current_count < self.webhook_threshold {
            return WebhookOutcome::Skipped;
        }

        let payload = WebhookPayload {
            total: report.current_count,
            added: report.added_count(),
            removed: report.removed_count,
            timestamp: Utc::now().timestamp(),
        };
        match webhook.post(&payload).await {
            Ok(()) => WebhookOutcome::Delivered,
            Err(e) => {
                log::error!("Webhook failed: {}", e);
                WebhookOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::test_support::{RecordingNotifier, RecordingWebhook, Sent, product};

    fn report(added: &[&str], removed: usize, current_count: usize) -> ChangeReport {
        ChangeReport {
            added: added.iter().map(|c| product(c)).collect(),
            removed_count: removed,
            previous_total: 0,
            current_total: current_count as u64,
            previous_count: current_count - added.len() + removed,
            current_count,
        }
    }

    fn dispatcher(notifier: &Arc<RecordingNotifier>) -> NotificationDispatcher {
        NotificationDispatcher::new(
            notifier.clone(),
            Some(ChatId::new("42")),
            "https://shop.example.com",
        )
    }

    #[tokio::test]
    async fn test_alerts_summary_and_pin() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut no_image = product("B");
        no_image.images.clear();
        let mut change = report(&["A"], 0, 5);
        change.added.push(no_image);

        let summary = dispatcher(&notifier).dispatch(&change).await;

        assert_eq!(summary.alerts_sent, 2);
        assert!(summary.summary_sent);
        assert!(summary.pinned);
        assert_eq!(summary.webhook, WebhookOutcome::Skipped);

        let sent = notifier.sent();
        assert!(matches!(
            &sent[0],
            Sent::Photo { image_url, button: Some(b), .. }
                if image_url == "https://img.example.com/A.jpg"
                    && b.url == "https://shop.example.com/p/A"
        ));
        assert!(matches!(&sent[1], Sent::Text { text, .. } if text.contains("`B`")));
        assert!(matches!(&sent[2], Sent::Text { text, .. } if text.contains("Catalog Update")));
        assert_eq!(notifier.pins(), vec![3]);
    }

    #[tokio::test]
    async fn test_alert_failures_do_not_block_summary() {
        let notifier = Arc::new(RecordingNotifier::default());
        notifier.fail_photo.store(true, Ordering::SeqCst);

        let summary = dispatcher(&notifier)
            .dispatch(&report(&["A", "B"], 1, 3))
            .await;

        assert_eq!(summary.alerts_sent, 0);
        assert_eq!(summary.alert_failures, 2);
        assert!(summary.summary_sent);
        assert_eq!(notifier.texts().len(), 1);
    }

    #[tokio::test]
    async fn test_pin_failure_is_ignored() {
        let notifier = Arc::new(RecordingNotifier::default());
        notifier.fail_pin.store(true, Ordering::SeqCst);

        let summary = dispatcher(&notifier).dispatch(&report(&[], 1, 3)).await;
        assert!(summary.summary_sent);
        assert!(!summary.pinned);
    }

    #[tokio::test]
    async fn test_webhook_threshold() {
        let notifier = Arc::new(RecordingNotifier::default());
        let webhook = Arc::new(RecordingWebhook::default());
        let dispatcher = dispatcher(&notifier).with_webhook(webhook.clone(), 100);

        let small = dispatcher.dispatch(&report(&["A"], 0, 99)).await;
        assert_eq!(small.webhook, WebhookOutcome::Skipped);

        let large = dispatcher.dispatch(&report(&["A"], 2, 100)).await;
        assert_eq!(large.webhook, WebhookOutcome::Delivered);

        let posted = webhook.posted();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].total, 100);
        assert_eq!(posted[0].added, 1);
        assert_eq!(posted[0].removed, 2);
    }

    #[tokio::test]
    async fn test_webhook_failure_is_contained() {
        let notifier = Arc::new(RecordingNotifier::default());
        let webhook = Arc::new(RecordingWebhook::default());
        webhook.fail.store(true, Ordering::SeqCst);
        let dispatcher = dispatcher(&notifier).with_webhook(webhook, 100);

        let summary = dispatcher.dispatch(&report(&["A"], 0, 150)).await;
        assert_eq!(summary.webhook, WebhookOutcome::Failed);
        assert_eq!(summary.alerts_sent, 1);
        assert!(summary.summary_sent);
    }

    #[tokio::test]
    async fn test_no_chat_still_posts_webhook() {
        let notifier = Arc::new(RecordingNotifier::default());
        let webhook = Arc::new(RecordingWebhook::default());
        let dispatcher = NotificationDispatcher::new(notifier.clone(), None, "https://x.test")
            .with_webhook(webhook.clone(), 1);

        let summary = dispatcher.dispatch(&report(&["A"], 0, 2)).await;
        assert!(notifier.sent().is_empty());
        assert!(!summary.summary_sent);
        assert_eq!(webhook.posted().len(), 1);
    }
}
