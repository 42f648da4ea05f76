//! HTTP fetcher implementation
//!
//! This module turns a listing URL into a parsed document:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests for listing pages
//! - Error classification (transport, timeout, non-2xx status)
//! - Decoding and parsing the response body
//!
//! There is no retry logic. The first failure is returned to the caller.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::model::PageFetchResult;
use crate::{CrawlError, FetchFailure};
use reqwest::{header::HeaderMap, Client};
use scraper::Html;
use std::time::Duration;
use url::Url;

/// Longest prefix of a non-2xx response body kept on the error
const DIAGNOSTIC_BODY_LIMIT: usize = 2048;

/// Upper bound for the connect timeout
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Crawler settings (request timeout)
/// * `user_agent` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use dependents_crawler::config::{CrawlerConfig, UserAgentConfig};
/// use dependents_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = crawler.request_timeout();

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches listing pages and parses them into documents
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Wraps an existing HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, CrawlError> {
        Ok(Self::new(build_http_client(crawler, user_agent)?))
    }

    /// Fetches a page and parses it
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Transport failure | `Fetch` / `Transport` |
    /// | Request timed out | `Fetch` / `Timeout` |
    /// | Status not 2xx | `Fetch` / `Status` (headers and body logged) |
    /// | Content-Type present and not HTML | `Parse` |
    /// | Body not valid UTF-8 | `Parse` |
    pub async fn fetch(&self, url: &Url) -> Result<PageFetchResult, CrawlError> {
        tracing::debug!("Requesting dependents page: {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?;

        let status = response.status();
        tracing::debug!("Response {} for {}", status.as_u16(), url);

        if !status.is_success() {
            let headers = format_headers(response.headers());
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                headers = %headers,
                body = %body,
                "Non-success response for {}",
                url
            );
            return Err(CrawlError::Fetch {
                url: url.to_string(),
                reason: FetchFailure::Status {
                    status: status.as_u16(),
                    body: body.chars().take(DIAGNOSTIC_BODY_LIMIT).collect(),
                },
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(CrawlError::Parse {
                url: url.to_string(),
                message: format!("expected HTML, got Content-Type '{}'", content_type),
            });
        }

        let bytes = response.bytes().await.map_err(|e| fetch_error(url, e))?;
        let body = String::from_utf8(bytes.to_vec()).map_err(|e| CrawlError::Parse {
            url: url.to_string(),
            message: format!("body is not valid UTF-8: {}", e),
        })?;

        let document = Html::parse_document(&body);
        if !document.errors.is_empty() {
            tracing::trace!(
                "{} recoverable markup errors on {}",
                document.errors.len(),
                url
            );
        }

        Ok(PageFetchResult::new(url.clone(), document))
    }
}

/// Classifies a transport error
fn fetch_error(url: &Url, error: reqwest::Error) -> CrawlError {
    let reason = if error.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Transport(error)
    };

    tracing::error!("Request to {} failed: {}", url, reason);

    CrawlError::Fetch {
        url: url.to_string(),
        reason,
    }
}

fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value.to_str().unwrap_or("<binary>")))
        .collect::<Vec<_>>()
        .join("; ")
}
