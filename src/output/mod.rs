//! Output module for crawl results
//!
//! This module handles:
//! - Summarising a completed crawl
//! - Generating markdown reports of the dependents found
//! - Printing dependents to the terminal

mod markdown;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use summary::{CrawlSummary, OutputError, OutputResult};

use crate::model::DependentRecord;
use std::io::Write;

/// Writes one `owner/name` line per dependent
///
/// # Arguments
///
/// * `records` - The dependents to print
/// * `out` - Destination, typically stdout
pub fn write_records<W: Write>(records: &[DependentRecord], out: &mut W) -> OutputResult<()> {
    for record in records {
        writeln!(out, "{}", record)?;
    }
    out.flush()?;
    Ok(())
}
