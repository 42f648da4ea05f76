//! Markdown summary generation
//!
//! This module generates human-readable markdown reports of a crawl,
//! including run information, statistics and the table of dependents.

use crate::model::DependentKind;
use crate::output::summary::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary of a crawl and writes it to a file
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Dependents of {}\n\n", summary.target));

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Listing**: {}\n", summary.seed_url));
    md.push_str(&format!("- **Mode**: {}\n", summary.mode));
    md.push_str(&format!(
        "- **Started**: {}\n",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        summary.duration.as_secs_f64()
    ));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Statistics
    md.push_str("## Statistics\n\n");
    md.push_str(&format!(
        "- **Pages Fetched**: {} (budget {})\n",
        summary.pages_fetched, summary.max_pages
    ));
    md.push_str(&format!("- **Dependents**: {}\n", summary.total_dependents()));
    md.push_str(&format!(
        "- **Dependents per Page**: {:.1}\n",
        summary.dependents_per_page()
    ));
    if summary.budget_exhausted() {
        md.push_str("- **Note**: page budget reached, the listing may continue\n");
    }
    md.push('\n');

    let counts = summary.count_by_kind();
    if !counts.is_empty() {
        md.push_str("| Kind | Count |\n");
        md.push_str("|------|-------|\n");
        for kind in DependentKind::all() {
            if let Some(count) = counts.get(&kind) {
                md.push_str(&format!("| {} | {} |\n", kind, count));
            }
        }
        md.push('\n');
    }

    // Dependents
    if !summary.records.is_empty() {
        md.push_str("## Dependents\n\n");
        md.push_str("| # | Owner | Repository | Kind | Page Cursor |\n");
        md.push_str("|---|-------|------------|------|-------------|\n");

        for (i, record) in summary.records.iter().enumerate() {
            let cursor = if record.after_cursor.is_empty() {
                "-"
            } else {
                record.after_cursor.as_str()
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                i + 1,
                escape_cell(&record.owner),
                escape_cell(&record.name),
                record.kind,
                escape_cell(cursor)
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
