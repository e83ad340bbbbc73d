// src/services/webhook.rs

//! Outbound change webhook.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::Result;

/// Body posted to the webhook.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookPayload {
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    /// Unix seconds
    pub timestamp: i64,
}

#[async_trait]
pub trait Webhook: Send + Sync {
    async fn post(&self, payload: &WebhookPayload) -> Result<()>;
}

/// JSON webhook over HTTP POST.
pub struct HttpWebhook {
    client: Client,
    url: String,
}

impl HttpWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Webhook for HttpWebhook {
    async fn post(&self, payload: &WebhookPayload) -> Result<()> {
        self.client
            .post(&self.url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
