//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a crawl:
//! run information, statistics, and every crawled page with its links.

use crate::output::summary::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Pages listed with their links before the listing is cut short
const MAX_LISTED_PAGES: usize = 500;

/// Generates a markdown summary and writes it to a file
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
    let report = &summary.report;
    let mut md = String::new();

    md.push_str("# SiteWalker Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Site**: {}\n", summary.base_url));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        report.elapsed.as_secs_f64()
    ));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages Admitted | {} |\n", report.pages_admitted));
    md.push_str(&format!("| Pages Fetched | {} |\n", report.pages_fetched));
    md.push_str(&format!("| Fetch Failures | {} |\n", report.fetch_failures));
    md.push_str(&format!("| Pages Processed | {} |\n", summary.pages_processed));
    md.push_str(&format!("| Links Found | {} |\n", summary.links_found));
    md.push_str(&format!(
        "| Processor Invocations | {} |\n",
        report.processor_invocations
    ));
    md.push_str(&format!(
        "| Processor Failures | {} |\n\n",
        report.processor_failures
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!(
        "- **Links per Page**: {:.2}\n\n",
        summary.links_per_page()
    ));

    // Crawled pages
    if !summary.pages.is_empty() {
        md.push_str("## Crawled Pages\n\n");
        for (url, page) in summary.pages.iter().take(MAX_LISTED_PAGES) {
            md.push_str(&format!("### {}\n\n", url));
            if page.links.is_empty() {
                md.push_str("_No links_\n\n");
                continue;
            }
            for link in &page.links {
                md.push_str(&format!("- `{}`\n", link));
            }
            md.push('\n');
        }
        if summary.pages.len() > MAX_LISTED_PAGES {
            md.push_str(&format!(
                "... and {} more\n\n",
                summary.pages.len() - MAX_LISTED_PAGES
            ));
        }
    }

    md
}
