//! Console report for a finished crawl

use crate::output::summary::CrawlSummary;
use std::io::{self, Write};

/// Writes the crawled URL listing and the totals
///
/// Each processed page is listed with the links it contains, followed by the
/// crawler's counters.
pub fn write_summary<W: Write>(summary: &CrawlSummary, out: &mut W) -> io::Result<()> {
    writeln!(out, "=== Crawled URLs ===\n")?;
    for (url, page) in &summary.pages {
        writeln!(out, "{}", url)?;
        for link in &page.links {
            writeln!(out, "  -> {}", link)?;
        }
    }
    writeln!(out)?;

    let report = &summary.report;
    writeln!(out, "=== Crawl Statistics ===\n")?;
    writeln!(out, "Overview:")?;
    writeln!(out, "  Site: {}", summary.base_url)?;
    writeln!(out, "  Pages admitted: {}", report.pages_admitted)?;
    writeln!(out, "  Pages fetched: {}", report.pages_fetched)?;
    writeln!(out, "  Fetch failures: {}", report.fetch_failures)?;
    writeln!(out, "  Pages processed: {}", summary.pages_processed)?;
    writeln!(out, "  Links found: {}", summary.links_found)?;
    if report.processor_failures > 0 {
        writeln!(
            out,
            "  Processor failures: {} of {} invocations",
            report.processor_failures, report.processor_invocations
        )?;
    }
    writeln!(out, "  Elapsed: {:.2}s", report.elapsed.as_secs_f64())?;
    writeln!(out)?;

    writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} fetches succeeded)",
        summary.success_rate(),
        report.pages_fetched,
        report.pages_fetched + report.fetch_failures
    )
}

/// Prints the summary to stdout
pub fn print_summary(summary: &CrawlSummary) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(summary, &mut out)
}
