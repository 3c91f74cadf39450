// src/utils/http.rs

//! HTTP fetching.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Status code and body of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub code: u16,
    pub body: String,
}

/// Source of page content. Non-2xx statuses are returned, not treated as errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let referrer = HeaderValue::from_str(&config.referrer)
        .map_err(|e| AppError::config(format!("crawler.referrer: {e}")))?;
    headers.insert(REFERER, referrer);

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// [`Fetcher`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;
        let code = response.status().as_u16();
        let body = response.text().await.map_err(|e| AppError::fetch(url, e))?;
        log::debug!("GET {} -> {}", url, code);
        Ok(FetchedPage { code, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(HttpFetcher::new(&CrawlerConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_referrer_is_config_error() {
        let config = CrawlerConfig {
            referrer: "bad\nvalue".into(),
            ..CrawlerConfig::default()
        };
        assert!(matches!(
            create_async_client(&config),
            Err(AppError::Config(_))
        ));
    }
}
