//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching under a timeout and a cancellation scope
//! - HTML link extraction and sitemap parsing
//! - The dedup ledger and the two worker stages
//! - Overall crawl orchestration

mod coordinator;
mod fetcher;
mod ledger;
mod parser;
mod sitemap;
mod stage;
mod task;

pub use coordinator::{Admission, CrawlPhase, CrawlReport, SiteCrawler};
pub use fetcher::{build_http_client, FetchError, PageFetcher};
pub use ledger::DedupLedger;
pub use parser::extract_links;
pub use sitemap::{parse_sitemap, SitemapError};
pub use stage::{CompletionCounter, QueueClosed, WorkQueue};
pub use task::{CrawlTask, ProcessTask};
