//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ChatId;
use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Catalog endpoint and request behavior
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Polling loop timing
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Chat and webhook delivery
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Retry policy for the command listener
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognized keys: `CATALOG_COOKIES`, `TELEGRAM_BOT_TOKEN`, `ADMIN_ID`,
    /// `WEBHOOK_URL`. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(cookie) = get("CATALOG_COOKIES") {
            self.catalog.cookie = cookie;
        }
        if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
            self.notify.bot_token = Some(token);
        }
        if let Some(chat) = get("ADMIN_ID") {
            self.notify.chat_id = Some(ChatId::new(chat));
        }
        if let Some(url) = get("WEBHOOK_URL") {
            self.notify.webhook_url = Some(url);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.endpoint.trim().is_empty() {
            return Err(AppError::validation("catalog.endpoint is empty"));
        }
        url::Url::parse(&self.catalog.endpoint)?;
        let origin = url::Url::parse(&self.catalog.base_origin)?;
        if origin.path() != "/" || origin.query().is_some() {
            return Err(AppError::validation(
                "catalog.base_origin must be a bare origin such as https://host",
            ));
        }
        if self.catalog.timeout_secs == 0 {
            return Err(AppError::validation("catalog.timeout_secs must be > 0"));
        }
        if self.catalog.max_concurrent == 0 {
            return Err(AppError::validation("catalog.max_concurrent must be > 0"));
        }
        if self.monitor.poll_interval_ms == 0 {
            return Err(AppError::validation("monitor.poll_interval_ms must be > 0"));
        }
        if self.supervisor.max_attempts == 0 {
            return Err(AppError::validation("supervisor.max_attempts must be > 0"));
        }
        if let Some(webhook) = &self.notify.webhook_url {
            url::Url::parse(webhook)?;
        }
        Ok(())
    }
}

/// Catalog endpoint and request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Listing API endpoint
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Site origin used to build product deep links
    #[serde(default = "defaults::base_origin")]
    pub base_origin: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum pages in flight during a full fetch
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Delay per page index before a page request is issued
    #[serde(default = "defaults::stagger")]
    pub stagger_ms: u64,

    /// Session cookie string sent with every request
    #[serde(default)]
    pub cookie: String,

    /// Static query parameters (`currentPage` is set per request)
    #[serde(default = "defaults::query")]
    pub query: BTreeMap<String, String>,

    /// Static request headers
    #[serde(default = "defaults::headers")]
    pub headers: BTreeMap<String, String>,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            base_origin: defaults::base_origin(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            stagger_ms: defaults::stagger(),
            cookie: String::new(),
            query: defaults::query(),
            headers: defaults::headers(),
        }
    }
}

/// Polling loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Sleep between metadata probes
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,

    /// Sleep after a cycle that failed unexpectedly
    #[serde(default = "defaults::error_cooldown")]
    pub error_cooldown_ms: u64,

    /// Wait before seeding state at startup
    #[serde(default = "defaults::startup_delay")]
    pub startup_delay_ms: u64,

    /// Send a readiness notice to the operator chat
    #[serde(default = "defaults::announce_startup")]
    pub announce_startup: bool,
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_millis(self.error_cooldown_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::poll_interval(),
            error_cooldown_ms: defaults::error_cooldown(),
            startup_delay_ms: defaults::startup_delay(),
            announce_startup: defaults::announce_startup(),
        }
    }
}

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Bot API token
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Operator chat that receives alerts
    #[serde(default)]
    pub chat_id: Option<ChatId>,

    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Long-poll timeout for command updates
    #[serde(default = "defaults::updates_timeout")]
    pub updates_timeout_secs: u64,

    /// Outbound webhook for large catalogs
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Minimum catalog size that triggers the webhook
    #[serde(default = "defaults::webhook_threshold")]
    pub webhook_threshold: usize,

    #[serde(default = "defaults::webhook_timeout")]
    pub webhook_timeout_secs: u64,

    /// Products returned by the manual check command
    #[serde(default = "defaults::manual_check_limit")]
    pub manual_check_limit: usize,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: defaults::api_base(),
            updates_timeout_secs: defaults::updates_timeout(),
            webhook_url: None,
            webhook_threshold: defaults::webhook_threshold(),
            webhook_timeout_secs: defaults::webhook_timeout(),
            manual_check_limit: defaults::manual_check_limit(),
        }
    }
}

/// Bounded retry policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "defaults::initial_backoff")]
    pub initial_backoff_secs: u64,

    #[serde(default = "defaults::max_backoff")]
    pub max_backoff_secs: u64,

    /// A run lasting at least this long resets the attempt counter
    #[serde(default = "defaults::healthy_after")]
    pub healthy_after_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_backoff_secs: defaults::initial_backoff(),
            max_backoff_secs: defaults::max_backoff(),
            healthy_after_secs: defaults::healthy_after(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;

    // Catalog defaults
    pub fn endpoint() -> String {
        "https://www.sheinindia.in/api/category/sverse-5939-37961".into()
    }
    pub fn base_origin() -> String {
        "https://www.sheinindia.in".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        3
    }
    pub fn stagger() -> u64 {
        100
    }

    fn pairs(items: &[(&str, &str)]) -> BTreeMap<String, String> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn query() -> BTreeMap<String, String> {
        pairs(&[
            ("fields", "SITE"),
            ("currentPage", "0"),
            ("pageSize", "45"),
            ("format", "json"),
            ("query", ":relevance:genderfilter:Men"),
            ("gridColumns", "5"),
            ("segmentIds", "22,17,7,18"),
            ("customerType", "Existing"),
            ("facets", "genderfilter:Men"),
            ("advfilter", "true"),
            ("platform", "Desktop"),
            ("showAdsOnNextPage", "false"),
            ("is_ads_enable_plp", "false"),
            ("displayRatings", "true"),
            ("store", "shein"),
        ])
    }

    pub fn headers() -> BTreeMap<String, String> {
        pairs(&[
            (
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36",
            ),
            ("Accept", "application/json"),
            ("Accept-Language", "en-US,en;q=0.7"),
            ("X-Tenant-Id", "SHEIN"),
            ("Referer", "https://www.sheinindia.in/c/sverse-5939-37961"),
        ])
    }

    // Monitor defaults
    pub fn poll_interval() -> u64 {
        1_000
    }
    pub fn error_cooldown() -> u64 {
        2_000
    }
    pub fn startup_delay() -> u64 {
        2_000
    }
    pub fn announce_startup() -> bool {
        true
    }

    // Notify defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn updates_timeout() -> u64 {
        25
    }
    pub fn webhook_threshold() -> usize {
        100
    }
    pub fn webhook_timeout() -> u64 {
        5
    }
    pub fn manual_check_limit() -> usize {
        3
    }

    // Supervisor defaults
    pub fn max_attempts() -> u32 {
        10
    }
    pub fn initial_backoff() -> u64 {
        10
    }
    pub fn max_backoff() -> u64 {
        60
    }
    pub fn healthy_after() -> u64 {
        300
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
