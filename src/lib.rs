//! SiteWalker: a single-host site crawler
//!
//! This crate crawls every reachable page of one web host. It honors
//! robots.txt, seeds itself from the site's sitemaps, discovers links
//! transitively and hands every fetched page to a set of pluggable
//! processors running in their own worker pool.

pub mod config;
pub mod crawler;
pub mod output;
pub mod processor;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for SiteWalker operations
///
/// Only configuration-class failures surface through this type. Per-page,
/// per-link and per-processor failures are logged where they happen.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build sitemap URL: {0}")]
    SitemapUrl(#[source] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for SiteWalker operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlSettings};
pub use crawler::{CrawlPhase, CrawlReport, SiteCrawler};
pub use processor::{LinkLogProcessor, ProcessingError, Processor};
pub use robots::RobotsPolicy;
pub use url::{resolve_and_clean, Target};
