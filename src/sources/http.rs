//! Shared HTTP client for the scrapers.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use std::time::Duration;

use crate::core::config::network;
use crate::core::error::{AppError, AppResult};
use crate::core::retry::{retry, RetryConfig};

/// reqwest client with browser-like headers and retry on transient failures.
///
/// Cheap to clone; all clones share the connection pool.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    /// Client with the scraping retry policy.
    pub fn new() -> AppResult<Self> {
        Self::with_retry(RetryConfig::scraping())
    }

    /// Client with a custom retry policy.
    pub fn with_retry(retry: RetryConfig) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(network::ACCEPT));

        let client = reqwest::Client::builder()
            .user_agent(network::USER_AGENT)
            .default_headers(headers)
            .timeout(network::page_timeout())
            .build()?;

        Ok(Self { client, retry })
    }

    /// GET an HTML page. Non-2xx statuses are errors.
    pub async fn get_html(&self, url: &str, params: &[(&str, &str)]) -> AppResult<String> {
        self.get_text(url, params, None, network::page_timeout()).await
    }

    /// GET a text file, decoding it with `charset` unless the server names one.
    pub async fn get_text_with_charset(&self, url: &str, charset: &str, timeout: Duration) -> AppResult<String> {
        self.get_text(url, &[], Some(charset), timeout).await
    }

    async fn get_text(
        &self,
        url: &str,
        params: &[(&str, &str)],
        charset: Option<&str>,
        timeout: Duration,
    ) -> AppResult<String> {
        let client = &self.client;

        retry(&self.retry, move || async move {
            log::debug!("GET {}", url);
            let response = client.get(url).query(params).timeout(timeout).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(AppError::HttpStatus {
                    url: url.to_string(),
                    status,
                });
            }

            let text = match charset {
                Some(charset) => response.text_with_charset(charset).await?,
                None => response.text().await?,
            };
            Ok(text)
        })
        .await
        .into_result()
    }
}
