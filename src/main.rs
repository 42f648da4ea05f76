//! Dependents-Crawler main entry point
//!
//! This is the command-line interface for crawling a repository's
//! dependents listing.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use dependents_crawler::config::{load_config_with_hash, Config, CrawlMode};
use dependents_crawler::crawler::{crawl, CrawlTarget};
use dependents_crawler::output::{generate_markdown_summary, write_records, CrawlSummary};
use dependents_crawler::DependentKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Dependents-Crawler: lists the repositories that depend on a repository
///
/// Walks the paginated dependents listing of OWNER/NAME, printing one
/// dependent per line. Settings come from an optional TOML file; flags
/// override the file.
#[derive(Parser, Debug)]
#[command(name = "dependents-crawler")]
#[command(version)]
#[command(about = "Lists the dependents of a repository", long_about = None)]
struct Cli {
    /// Owner of the repository
    #[arg(value_name = "OWNER")]
    owner: String,

    /// Name of the repository
    #[arg(value_name = "NAME")]
    name: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of listing pages to visit
    #[arg(short, long)]
    max_pages: Option<usize>,

    /// Run fetching and extraction as concurrent pipeline stages
    #[arg(long)]
    pipelined: bool,

    /// Only list dependents of this kind (repository or package)
    #[arg(long = "type", value_name = "KIND")]
    kind: Option<DependentKind>,

    /// Host serving the dependents listing
    #[arg(long)]
    base_url: Option<String>,

    /// Write a markdown summary to this file
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_settings(&cli)?;

    let mut target = CrawlTarget::new(cli.owner.clone(), cli.name.clone());
    if let Some(kind) = cli.kind {
        target = target.with_kind(kind);
    }

    let base = Url::parse(&config.crawler.base_url).context("Invalid base URL")?;
    let seed = target.seed_url(&base)?;

    let started_at = Utc::now();
    let start = Instant::now();

    let outcome = match crawl(&config, &target).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        "Found {} dependents on {} pages",
        outcome.records.len(),
        outcome.pages_fetched
    );

    write_records(&outcome.records, &mut std::io::stdout().lock())?;

    if let Some(path) = &config.output.summary_path {
        let mut summary = CrawlSummary::new(
            &target,
            seed.as_str(),
            config.crawler.mode,
            config.crawler.max_pages,
            started_at,
            start.elapsed(),
            outcome,
        );
        if let Some(hash) = config_hash {
            summary = summary.with_config_hash(hash);
        }

        generate_markdown_summary(&summary, Path::new(path))
            .with_context(|| format!("Failed to write summary to {}", path))?;
        tracing::info!("Summary written to {}", path);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dependents_crawler=info,warn"),
            1 => EnvFilter::new("dependents_crawler=debug,info"),
            2 => EnvFilter::new("dependents_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration file, if any, and applies command-line overrides
fn load_settings(cli: &Cli) -> anyhow::Result<(Config, Option<String>)> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if cli.pipelined {
        config.crawler.mode = CrawlMode::Pipelined;
    }
    if let Some(base_url) = &cli.base_url {
        config.crawler.base_url = base_url.clone();
    }
    if let Some(summary) = &cli.summary {
        config.output.summary_path = Some(summary.display().to_string());
    }

    dependents_crawler::config::validate(&config)?;

    Ok((config, hash))
}
