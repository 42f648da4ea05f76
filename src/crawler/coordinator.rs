//! Sequential crawl orchestration
//!
//! This module contains the sequential crawl loop:
//! - Fetch the current listing page
//! - Extract its dependents
//! - Extract the next page URL
//! - Repeat until there is no next page or the page budget is spent

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{extract_dependents, extract_next_page};
use crate::crawler::CrawlOutcome;
use crate::CrawlError;
use std::time::Instant;
use url::Url;

/// Drives the sequential crawl
pub struct Coordinator {
    fetcher: PageFetcher,
    next_url: Option<Url>,
    max_pages: usize,
    pages_processed: usize,
}

impl Coordinator {
    /// Creates a coordinator starting at `seed`
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The page fetcher
    /// * `seed` - URL of the first listing page
    /// * `max_pages` - Page budget; 0 fetches nothing
    pub fn new(fetcher: PageFetcher, seed: Url, max_pages: usize) -> Self {
        Self {
            fetcher,
            next_url: Some(seed),
            max_pages,
            pages_processed: 0,
        }
    }

    /// Number of pages processed so far
    pub fn pages_processed(&self) -> usize {
        self.pages_processed
    }

    /// Returns true while there is a next page and budget left
    pub fn has_next(&self) -> bool {
        self.next_url.is_some() && self.pages_processed < self.max_pages
    }

    /// Runs the crawl loop to completion
    ///
    /// Any fetch or extraction failure aborts the crawl; records gathered
    /// from earlier pages are discarded with it.
    pub async fn run(&mut self) -> Result<CrawlOutcome, CrawlError> {
        tracing::info!(
            "Starting sequential crawl, at most {} pages",
            self.max_pages
        );

        let start_time = Instant::now();
        let mut records = Vec::new();

        while self.has_next() {
            let Some(url) = self.next_url.take() else {
                break;
            };

            let page = self.fetcher.fetch(&url).await?;
            let dependents = extract_dependents(&page)?;
            self.next_url = extract_next_page(&page.document, &page.url)?;
            self.pages_processed += 1;

            tracing::info!(
                "Page {}: {} dependents from {}",
                self.pages_processed,
                dependents.len(),
                url
            );
            records.extend(dependents);
        }

        if self.next_url.is_none() {
            tracing::info!("Listing exhausted after {} pages", self.pages_processed);
        } else {
            tracing::info!("Page budget of {} spent", self.max_pages);
        }

        tracing::info!(
            "Crawl completed: {} dependents from {} pages in {:?}",
            records.len(),
            self.pages_processed,
            start_time.elapsed()
        );

        Ok(CrawlOutcome {
            records,
            pages_fetched: self.pages_processed,
        })
    }
}

/// Runs the sequential crawl starting at `seed`
///
/// # Example
///
/// ```no_run
/// use dependents_crawler::config::{CrawlerConfig, UserAgentConfig};
/// use dependents_crawler::crawler::{crawl_sequential, PageFetcher};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = PageFetcher::from_config(&CrawlerConfig::default(), &UserAgentConfig::default())?;
/// let seed = Url::parse("https://github.com/inconshreveable/mousetrap/network/dependents")?;
/// let outcome = crawl_sequential(&fetcher, seed, 5).await?;
/// println!("{} dependents", outcome.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl_sequential(
    fetcher: &PageFetcher,
    seed: Url,
    max_pages: usize,
) -> Result<CrawlOutcome, CrawlError> {
    Coordinator::new(fetcher.clone(), seed, max_pages).run().await
}
