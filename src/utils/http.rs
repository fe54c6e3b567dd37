// src/utils/http.rs

//! HTTP client utilities.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Source of page bodies for the crawler.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a page and return its full body text.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()?;
    Ok(client)
}

/// Page fetcher backed by reqwest.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl PageFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::status(url, status));
        }
        Ok(response.text().await?)
    }

    /// Run `attempt_fn` until it succeeds, fails with a non-transport error,
    /// or `max_retries` retries are used up.
    async fn with_retries<T, F, Fut>(&self, url: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match attempt_fn().await {
                Err(e) if e.is_transport() && attempt < self.max_retries => {
                    attempt += 1;
                    log::warn!(
                        "Fetch {} failed ({}), retry {}/{}",
                        url,
                        e,
                        attempt,
                        self.max_retries
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.with_retries(url, move || self.fetch_once(url)).await
    }
}
