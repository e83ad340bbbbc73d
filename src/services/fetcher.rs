// src/services/fetcher.rs

//! Single-page access to the catalog listing API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::{CatalogConfig, CatalogPage};

/// Query parameter carrying the page index.
const PAGE_PARAM: &str = "currentPage";

/// Fetches one page of the catalog. Implementations never retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch and parse page `page` (0-based).
    async fn fetch_page(&self, page: u32) -> Result<CatalogPage>;
}

/// `PageFetcher` backed by a reqwest client with a fixed header set.
pub struct HttpPageFetcher {
    client: Client,
    endpoint: String,
    query: BTreeMap<String, String>,
}

impl HttpPageFetcher {
    /// Build a fetcher from the catalog configuration.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .default_headers(build_headers(config)?)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            query: config.query.clone(),
        })
    }

    /// Query parameters for `page`, with the page index overriding any static value.
    fn page_query(&self, page: u32) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .query
            .iter()
            .filter(|(k, _)| k.as_str() != PAGE_PARAM)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.push((PAGE_PARAM.to_string(), page.to_string()));
        params
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, page: u32) -> Result<CatalogPage> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.page_query(page))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        Ok(response.json::<CatalogPage>().await?)
    }
}

fn build_headers(config: &CatalogConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::config(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("invalid value for header '{name}': {e}")))?;
        headers.insert(header, value);
    }

    let cookie = config.cookie.trim();
    if !cookie.is_empty() {
        let value = HeaderValue::from_str(cookie)
            .map_err(|e| AppError::config(format!("invalid cookie string: {e}")))?;
        headers.insert(COOKIE, value);
    }
    Ok(headers)
}
