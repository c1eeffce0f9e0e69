use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Default capacity of the crawl queue
///
/// Crawl workers are the producers of their own queue, so this is sized well
/// above the page count of any realistic site.
pub const DEFAULT_CRAWL_QUEUE_CAPACITY: usize = 100_000;

/// Default capacity of the post-process queue
pub const DEFAULT_PROCESS_QUEUE_CAPACITY: usize = 24;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default number of workers per stage
pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;

/// Main configuration structure for SiteWalker
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Root of the site to crawl; only this host is ever fetched
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Number of workers in each stage
    #[serde(rename = "worker-pool-size")]
    pub worker_pool_size: usize,

    /// Timeout applied to every fetch (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Capacity of the crawl queue
    #[serde(
        rename = "crawl-queue-capacity",
        default = "default_crawl_queue_capacity"
    )]
    pub crawl_queue_capacity: usize,

    /// Capacity of the post-process queue
    #[serde(
        rename = "process-queue-capacity",
        default = "default_process_queue_capacity"
    )]
    pub process_queue_capacity: usize,
}

fn default_crawl_queue_capacity() -> usize {
    DEFAULT_CRAWL_QUEUE_CAPACITY
}

fn default_process_queue_capacity() -> usize {
    DEFAULT_PROCESS_QUEUE_CAPACITY
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path to the markdown summary file, if one should be written
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Runtime settings for one [`SiteCrawler`](crate::crawler::SiteCrawler)
///
/// Built from a [`Config`] by the binary, or directly by library callers.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Root of the site; its host bounds the crawl
    pub base_url: Url,

    /// User-Agent header value, also used for robots.txt group selection
    pub user_agent: String,

    /// Timeout applied to every fetch
    pub request_timeout: Duration,

    /// Number of workers in each stage
    pub worker_pool_size: usize,

    /// Capacity of the crawl queue
    pub crawl_queue_capacity: usize,

    /// Capacity of the post-process queue
    pub process_queue_capacity: usize,
}

impl CrawlSettings {
    /// Creates settings with default timeout, pool size and queue capacities
    pub fn new(base_url: Url, user_agent: impl Into<String>) -> Self {
        Self {
            base_url,
            user_agent: user_agent.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            crawl_queue_capacity: DEFAULT_CRAWL_QUEUE_CAPACITY,
            process_queue_capacity: DEFAULT_PROCESS_QUEUE_CAPACITY,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size.max(1);
        self
    }

    pub fn with_queue_capacities(mut self, crawl: usize, process: usize) -> Self {
        self.crawl_queue_capacity = crawl.max(1);
        self.process_queue_capacity = process.max(1);
        self
    }
}

impl TryFrom<&Config> for CrawlSettings {
    type Error = ConfigError;

    fn try_from(config: &Config) -> Result<Self, Self::Error> {
        let base_url = Url::parse(&config.crawler.base_url).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid base-url '{}': {}",
                config.crawler.base_url, e
            ))
        })?;

        Ok(Self {
            base_url,
            user_agent: config.user_agent.user_agent_string(),
            request_timeout: Duration::from_millis(config.crawler.request_timeout_ms),
            worker_pool_size: config.crawler.worker_pool_size,
            crawl_queue_capacity: config.crawler.crawl_queue_capacity,
            process_queue_capacity: config.crawler.process_queue_capacity,
        })
    }
}
