//! Crawl summary types
//!
//! This module defines the summary of a completed crawl and the errors
//! that can occur while writing output.

use crate::config::CrawlMode;
use crate::crawler::{CrawlOutcome, CrawlTarget};
use crate::model::{DependentKind, DependentRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of a completed crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub target: String,
    pub seed_url: String,
    pub mode: CrawlMode,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub config_hash: Option<String>,

    // Crawl statistics
    pub max_pages: usize,
    pub pages_fetched: usize,

    // Dependents found, in crawl order
    pub records: Vec<DependentRecord>,
}

impl CrawlSummary {
    /// Builds a summary from a finished crawl
    pub fn new(
        target: &CrawlTarget,
        seed_url: &str,
        mode: CrawlMode,
        max_pages: usize,
        started_at: DateTime<Utc>,
        duration: Duration,
        outcome: CrawlOutcome,
    ) -> Self {
        Self {
            target: format!("{}/{}", target.owner, target.name),
            seed_url: seed_url.to_string(),
            mode,
            started_at,
            duration,
            config_hash: None,
            max_pages,
            pages_fetched: outcome.pages_fetched,
            records: outcome.records,
        }
    }

    /// Attaches the hash of the configuration file used
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Total number of dependents found
    pub fn total_dependents(&self) -> usize {
        self.records.len()
    }

    /// Number of dependents of each kind
    pub fn count_by_kind(&self) -> HashMap<DependentKind, usize> {
        let mut counts = HashMap::new();
        for record in &self.records {
            *counts.entry(record.kind).or_insert(0) += 1;
        }
        counts
    }

    /// True when the crawl stopped because the page budget ran out
    pub fn budget_exhausted(&self) -> bool {
        self.pages_fetched >= self.max_pages
    }

    /// Average number of dependents per fetched page
    pub fn dependents_per_page(&self) -> f64 {
        if self.pages_fetched == 0 {
            return 0.0;
        }
        self.records.len() as f64 / self.pages_fetched as f64
    }
}
