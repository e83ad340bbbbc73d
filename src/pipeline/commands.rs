// src/pipeline/commands.rs

//! Operator commands received over Bot API long polling.
//!
//! Commands are read-only: they fetch page 0 on demand and never touch the
//! monitor state.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChatId, Product};
use crate::pipeline::dispatch::send_product;
use crate::pipeline::messages;
use crate::services::{CatalogFetcher, Notifier, TelegramNotifier, Update};

/// Supported chat commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Check,
}

impl Command {
    /// Parse the first word of a message; `/check@SomeBot` is accepted.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "check" => Some(Self::Check),
            _ => None,
        }
    }
}

/// Source of incoming updates.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn updates(&self, offset: Option<i64>) -> Result<Vec<Update>>;
}

#[async_trait]
impl UpdateSource for TelegramNotifier {
    async fn updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        self.get_updates(offset).await
    }
}

pub struct CommandHandler {
    catalog: CatalogFetcher,
    notifier: Arc<dyn Notifier>,
    base_origin: String,
    endpoint: String,
    poll_interval: Duration,
    limit: usize,
}

impl CommandHandler {
    pub fn new(
        catalog: CatalogFetcher,
        notifier: Arc<dyn Notifier>,
        base_origin: impl Into<String>,
        endpoint: impl Into<String>,
        poll_interval: Duration,
        limit: usize,
    ) -> Self {
        Self {
            catalog,
            notifier,
            base_origin: base_origin.into(),
            endpoint: endpoint.into(),
            poll_interval,
            limit,
        }
    }

    /// Up to `limit` products from page 0; empty when the fetch failed.
    pub async fn manual_check(&self) -> Vec<Product> {
        match self.catalog.fetch_metadata().await {
            Some(page) => page.products.into_iter().take(self.limit).collect(),
            None => Vec::new(),
        }
    }

    /// Reply to `command` in `chat`.
    pub async fn handle(&self, chat: &ChatId, command: Command) -> Result<()> {
        match command {
            Command::Start => {
                let text = messages::welcome(&self.endpoint, self.poll_interval);
                self.notifier.send_text(chat, &text, None).await?;
            }
            Command::Check => {
                self.notifier
                    .send_text(chat, messages::MANUAL_CHECK_RUNNING, None)
                    .await?;

                let products = self.manual_check().await;
                if products.is_empty() {
                    self.notifier
                        .send_text(chat, messages::MANUAL_CHECK_EMPTY, None)
                        .await?;
                    return Ok(());
                }
                for product in &products {
                    let caption = messages::product_card(product);
                    send_product(
                        self.notifier.as_ref(),
                        chat,
                        &self.base_origin,
                        product,
                        &caption,
                    )
                    .await?;
                }
            }
        }
        Ok(())
    }
}

/// Long-polls for updates and hands commands to a `CommandHandler`.
pub struct CommandListener {
    source: Arc<dyn UpdateSource>,
    handler: CommandHandler,
    offset: AtomicI64,
}

impl CommandListener {
    pub fn new(source: Arc<dyn UpdateSource>, handler: CommandHandler) -> Self {
        Self {
            source,
            handler,
            offset: AtomicI64::new(0),
        }
    }

    /// Next `update_id` to request; 0 before the first update.
    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::SeqCst)
    }

    /// Fetch and handle one batch of updates.
    ///
    /// Handler failures are logged; only a failed poll is returned.
    pub async fn poll_once(&self) -> Result<usize> {
        let offset = Some(self.offset()).filter(|o| *o > 0);
        let updates = self.source.updates(offset).await?;
        let count = updates.len();

        for update in updates {
            self.offset.fetch_max(update.update_id + 1, Ordering::SeqCst);

            let Some(message) = update.message else {
                continue;
            };
            let Some(command) = message.text.as_deref().and_then(Command::parse) else {
                continue;
            };
            let chat = ChatId::new(message.chat.id.to_string());
            log::info!("Command {:?} from chat {}", command, chat);
            if let Err(e) = self.handler.handle(&chat, command).await {
                log::error!("Failed to answer {:?} in chat {}: {}", command, chat, e);
            }
        }
        Ok(count)
    }

    /// Poll until the update source fails.
    pub async fn run(&self) -> Result<()> {
        log::info!("Command listener started");
        loop {
            self.poll_once().await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::{IncomingChat, IncomingMessage};
    use crate::test_support::{RecordingNotifier, ScriptedFetcher, ScriptedUpdates, Sent};

    fn update(id: i64, chat: i64, text: Option<&str>) -> Update {
        Update {
            update_id: id,
            message: Some(IncomingMessage {
                message_id: id,
                chat: IncomingChat { id: chat },
                text: text.map(str::to_string),
            }),
        }
    }

    fn handler(fetcher: &Arc<ScriptedFetcher>, notifier: &Arc<RecordingNotifier>) -> CommandHandler {
        CommandHandler::new(
            CatalogFetcher::with_limits(fetcher.clone(), 3, Duration::ZERO),
            notifier.clone(),
            "https://shop.example.com",
            "https://api.example.com/c/sale",
            Duration::from_millis(1000),
            3,
        )
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("  /check@CatalogBot now"), Some(Command::Check));
        assert_eq!(Command::parse("/CHECK"), Some(Command::Check));
        assert_eq!(Command::parse("check"), None);
        assert_eq!(Command::parse("/stop"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[tokio::test]
    async fn test_start_replies_with_status() {
        let fetcher = Arc::new(ScriptedFetcher::new(&["A"], 10));
        let notifier = Arc::new(RecordingNotifier::default());

        handler(&fetcher, &notifier)
            .handle(&ChatId::new("7"), Command::Start)
            .await
            .unwrap();

        let texts = notifier.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("api.example.com/c/sale"));
        assert!(texts[0].contains("1000ms"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_check_sends_first_products() {
        let fetcher = Arc::new(ScriptedFetcher::new(&["A", "B", "C", "D"], 10));
        let notifier = Arc::new(RecordingNotifier::default());

        handler(&fetcher, &notifier)
            .handle(&ChatId::new("7"), Command::Check)
            .await
            .unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 4);
        assert!(matches!(&sent[0], Sent::Text { text, .. } if text == messages::MANUAL_CHECK_RUNNING));
        let captions = notifier.photos();
        assert_eq!(captions.len(), 3);
        assert!(captions[0].contains("Item A"));
        assert!(captions[2].contains("Item C"));
    }

    #[tokio::test]
    async fn test_check_reports_empty_fetch() {
        let fetcher = Arc::new(ScriptedFetcher::new(&["A"], 10));
        fetcher.set_unavailable(true);
        let notifier = Arc::new(RecordingNotifier::default());

        handler(&fetcher, &notifier)
            .handle(&ChatId::new("7"), Command::Check)
            .await
            .unwrap();

        assert_eq!(
            notifier.texts(),
            vec![
                messages::MANUAL_CHECK_RUNNING.to_string(),
                messages::MANUAL_CHECK_EMPTY.to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_listener_advances_offset_and_replies_to_sender() {
        let fetcher = Arc::new(ScriptedFetcher::new(&["A"], 10));
        let notifier = Arc::new(RecordingNotifier::default());
        let source = Arc::new(ScriptedUpdates::default());
        source.push(Ok(vec![
            update(10, 5, Some("hello")),
            update(11, 5, None),
            update(12, 9, Some("/start")),
        ]));
        source.push(Ok(Vec::new()));

        let listener = CommandListener::new(source.clone(), handler(&fetcher, &notifier));
        assert_eq!(listener.poll_once().await.unwrap(), 3);
        assert_eq!(listener.offset(), 13);
        listener.poll_once().await.unwrap();

        assert_eq!(source.offsets(), vec![None, Some(13)]);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], Sent::Text { chat, .. } if chat.0 == "9"));
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_stop_listener() {
        let fetcher = Arc::new(ScriptedFetcher::new(&["A"], 10));
        let notifier = Arc::new(RecordingNotifier::default());
        notifier.fail_text.store(true, Ordering::SeqCst);
        let source = Arc::new(ScriptedUpdates::default());
        source.push(Ok(vec![update(1, 5, Some("/start"))]));

        let listener = CommandListener::new(source.clone(), handler(&fetcher, &notifier));
        assert!(listener.poll_once().await.is_ok());
        assert_eq!(listener.offset(), 2);
    }

    #[tokio::test]
    async fn test_run_returns_poll_error() {
        let fetcher = Arc::new(ScriptedFetcher::new(&["A"], 10));
        let notifier = Arc::new(RecordingNotifier::default());
        let source = Arc::new(ScriptedUpdates::default());
        source.push(Ok(vec![update(1, 5, Some("/start"))]));

        let listener = CommandListener::new(source, handler(&fetcher, &notifier));
        let result = listener.run().await;

        assert!(matches!(result, Err(AppError::Notify(_))));
        assert_eq!(notifier.texts().len(), 1);
    }
}
