//! Crawler module for walking a dependents listing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching of listing pages
//! - Record and next-link extraction from parsed pages
//! - Sequential and pipelined crawl orchestration
//! - The overall crawl deadline

mod coordinator;
mod fetcher;
mod parser;
mod pipeline;
mod supervisor;

pub use coordinator::{crawl_sequential, Coordinator};
pub use fetcher::{build_http_client, PageFetcher};
pub use parser::{extract_dependents, extract_next_page};
pub use pipeline::crawl_pipelined;
pub use supervisor::{CloseReason, Supervisor};

use crate::config::{Config, CrawlMode};
use crate::listing::dependents_url;
use crate::model::{DependentKind, DependentRecord};
use crate::CrawlError;
use tracing::Instrument;
use url::Url;

/// The repository whose dependents are crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub owner: String,
    pub name: String,

    /// Restricts the listing to one kind of dependent
    pub kind: Option<DependentKind>,
}

impl CrawlTarget {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: DependentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Returns the seed listing URL on `base`
    pub fn seed_url(&self, base: &Url) -> Result<Url, CrawlError> {
        Ok(dependents_url(base, &self.owner, &self.name, self.kind)?)
    }
}

/// Result of a completed crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    /// Every record from every visited page
    pub records: Vec<DependentRecord>,

    /// Number of listing pages fetched
    pub pages_fetched: usize,
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the seed URL from the configured base URL
/// 2. Build the HTTP client
/// 3. Run the configured orchestrator inside a `crawl` tracing span
/// 4. Enforce the overall crawl deadline, if configured
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `target` - The repository to crawl dependents of
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Crawl completed successfully
/// * `Err(CrawlError)` - Crawl failed; no partial records are returned
pub async fn crawl(config: &Config, target: &CrawlTarget) -> Result<CrawlOutcome, CrawlError> {
    let base = Url::parse(&config.crawler.base_url)?;
    let seed = target.seed_url(&base)?;
    let fetcher = PageFetcher::from_config(&config.crawler, &config.user_agent)?;
    let max_pages = config.crawler.max_pages;
    let mode = config.crawler.mode;

    let span = tracing::info_span!(
        "crawl",
        owner = %target.owner,
        name = %target.name,
        mode = %mode
    );

    let run = async {
        tracing::info!("Crawling {} (at most {} pages)", seed, max_pages);
        match mode {
            CrawlMode::Sequential => crawl_sequential(&fetcher, seed, max_pages).await,
            CrawlMode::Pipelined => crawl_pipelined(&fetcher, seed, max_pages).await,
        }
    }
    .instrument(span);

    match config.crawler.crawl_deadline() {
        Some(after) => tokio::time::timeout(after, run)
            .await
            .map_err(|_| CrawlError::DeadlineExceeded { after })?,
        None => run.await,
    }
}
