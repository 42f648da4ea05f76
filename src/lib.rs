//! Dependents-Crawler: walks a repository's "used by" listing
//!
//! This crate crawls the paginated dependents listing of a repository,
//! extracting one record per dependent and following the listing's
//! "next page" control until the listing is exhausted or a page budget
//! is spent. Two orchestrators share the same fetcher and extractors:
//! a sequential loop and a multi-stage pipeline.

pub mod config;
pub mod crawler;
pub mod listing;
pub mod model;
pub mod output;

use std::time::Duration;
use thiserror::Error;

/// Main error type for crawl operations
///
/// Every variant is fatal to the crawl that produced it. No retry is
/// attempted and no partial result is returned alongside an error.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: FetchFailure },

    #[error("Failed to parse page {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Malformed dependents page {url}: {message}")]
    MalformedPage { url: String, message: String },

    #[error("Crawl did not finish within {after:?}")]
    DeadlineExceeded { after: Duration },

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl CrawlError {
    /// Builds a `MalformedPage` error for the given page URL
    pub fn malformed(url: impl ToString, message: impl Into<String>) -> Self {
        Self::MalformedPage {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// Why a single page fetch failed
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Non-2xx response; `body` holds the start of the response for diagnostics
    #[error("unexpected HTTP status {status}")]
    Status { status: u16, body: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, CrawlMode};
pub use crawler::{crawl, crawl_pipelined, crawl_sequential, CrawlOutcome, CrawlTarget};
pub use model::{DependentKind, DependentRecord, PageFetchResult};
