//! Configuration module for SiteWalker
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and converting them into the runtime [`CrawlSettings`] a crawler is built from.
//!
//! # Example
//!
//! ```no_run
//! use sitewalker::config::{load_config, CrawlSettings};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! let settings = CrawlSettings::try_from(&config).unwrap();
//! println!("Crawling {} with {} workers", settings.base_url, settings.worker_pool_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlSettings, CrawlerConfig, OutputConfig, UserAgentConfig,
    DEFAULT_CRAWL_QUEUE_CAPACITY, DEFAULT_PROCESS_QUEUE_CAPACITY, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_WORKER_POOL_SIZE,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

// Re-export validation
pub use validation::validate;
