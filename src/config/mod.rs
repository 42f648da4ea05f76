//! Configuration module for Dependents-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so an empty file is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use dependents_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlMode, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::validate;
