//! Crawl summary types
//!
//! A [`CrawlSummary`] joins the crawler's own counters with what the link log
//! recorded, so the report and the markdown export read from one place.

use crate::crawler::CrawlReport;
use crate::processor::{CrawledPage, LinkLogProcessor};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything known about a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: Option<String>,

    // Crawler counters
    pub report: CrawlReport,

    // Link log
    pub pages_processed: u64,
    pub links_found: u64,
    pub pages: Vec<(String, CrawledPage)>,
}

impl CrawlSummary {
    /// Builds a summary from a finished crawl and its link log
    pub fn new(
        base_url: impl Into<String>,
        started_at: DateTime<Utc>,
        report: CrawlReport,
        link_log: &LinkLogProcessor,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            started_at,
            finished_at: Utc::now(),
            config_hash: None,
            report,
            pages_processed: link_log.pages_processed(),
            links_found: link_log.links_found(),
            pages: link_log.pages(),
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Returns the share of fetch attempts that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempts = self.report.pages_fetched + self.report.fetch_failures;
        if attempts == 0 {
            return 0.0;
        }
        (self.report.pages_fetched as f64 / attempts as f64) * 100.0
    }

    /// Average number of links per processed page
    pub fn links_per_page(&self) -> f64 {
        if self.pages_processed == 0 {
            return 0.0;
        }
        self.links_found as f64 / self.pages_processed as f64
    }
}
