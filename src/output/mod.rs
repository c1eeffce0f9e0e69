//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Joining crawler counters with the link log into a [`CrawlSummary`]
//! - Printing the crawled URL listing and totals to stdout
//! - Exporting a markdown summary

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_summary, write_summary};
pub use summary::{CrawlSummary, OutputError, OutputResult};
