// src/services/notifier.rs

//! Chat delivery capability and its Telegram Bot API implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{ChatId, MessageId, NotifyConfig};

/// Inline button opening a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub text: String,
    pub url: String,
}

impl LinkButton {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}

/// Chat operations used by the monitor. Every call is fallible and
/// independent of the others.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(
        &self,
        chat: &ChatId,
        text: &str,
        button: Option<&LinkButton>,
    ) -> Result<MessageId>;

    async fn send_photo(
        &self,
        chat: &ChatId,
        image_url: &str,
        caption: &str,
        button: Option<&LinkButton>,
    ) -> Result<MessageId>;

    async fn pin(&self, chat: &ChatId, message: MessageId) -> Result<()>;
}

/// Bot API envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

/// Incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: MessageId,
    pub chat: IncomingChat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingChat {
    pub id: i64,
}

/// Telegram Bot API client.
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    updates_timeout_secs: u64,
}

impl TelegramNotifier {
    /// Create a client; requires `notify.bot_token`.
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let token = config
            .bot_token
            .as_deref()
            .ok_or_else(|| AppError::config("notify.bot_token is not set"))?;

        // Long polls hold the connection for `updates_timeout_secs`.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.updates_timeout_secs + 15))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
            updates_timeout_secs: config.updates_timeout_secs,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await?;
        let reply: ApiResponse<T> = response.json().await?;
        unwrap_reply(method, reply)
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let mut body = json!({
            "timeout": self.updates_timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", &body).await
    }
}

fn unwrap_reply<T>(method: &str, reply: ApiResponse<T>) -> Result<T> {
    if !reply.ok {
        let description = reply
            .description
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(AppError::telegram(method, description));
    }
    reply
        .result
        .ok_or_else(|| AppError::telegram(method, "response carried no result"))
}

fn keyboard(button: Option<&LinkButton>) -> Option<Value> {
    button.map(|b| {
        json!({
            "inline_keyboard": [[{ "text": b.text, "url": b.url }]]
        })
    })
}

fn text_body(chat: &ChatId, text: &str, button: Option<&LinkButton>) -> Value {
    let mut body = json!({
        "chat_id": chat.0,
        "text": text,
        "parse_mode": "Markdown",
    });
    if let Some(markup) = keyboard(button) {
        body["reply_markup"] = markup;
    }
    body
}

fn photo_body(chat: &ChatId, image_url: &str, caption: &str, button: Option<&LinkButton>) -> Value {
    let mut body = json!({
        "chat_id": chat.0,
        "photo": image_url,
        "caption": caption,
        "parse_mode": "Markdown",
    });
    if let Some(markup) = keyboard(button) {
        body["reply_markup"] = markup;
    }
    body
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(
        &self,
        chat: &ChatId,
        text: &str,
        button: Option<&LinkButton>,
    ) -> Result<MessageId> {
        let sent: SentMessage = self
            .call("sendMessage", &text_body(chat, text, button))
            .await?;
        Ok(sent.message_id)
    }

    async fn send_photo(
        &self,
        chat: &ChatId,
        image_url: &str,
        caption: &str,
        button: Option<&LinkButton>,
    ) -> Result<MessageId> {
        let sent: SentMessage = self
            .call("sendPhoto", &photo_body(chat, image_url, caption, button))
            .await?;
        Ok(sent.message_id)
    }

    async fn pin(&self, chat: &ChatId, message: MessageId) -> Result<()> {
        let body = json!({
            "chat_id": chat.0,
            "message_id": message,
            "disable_notification": true,
        });
        let _: bool = self.call("pinChatMessage", &body).await?;
        Ok(())
    }
}
