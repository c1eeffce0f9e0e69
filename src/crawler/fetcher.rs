//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent
//! - GET requests under the per-request timeout
//! - Racing every request against the crawl's cancellation scope
//! - Error classification

use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Failure of a single fetch
///
/// Every variant carries the requested URL so the caller can log it and move on.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered outside the 200-299 range
    #[error("HTTP error: {status} from {url}")]
    Status { status: StatusCode, url: String },

    /// The request did not finish within the configured timeout
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    /// Connection, TLS or body read failure
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The cancellation scope fired before the request finished
    #[error("Request to {url} cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    /// Returns true if the fetch was abandoned because of cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header value
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages as text
///
/// Cheap to share: the inner client is reference counted and the fetcher
/// itself holds no per-request state.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
}

impl PageFetcher {
    /// Creates a fetcher sending `user_agent` and applying `timeout` to every request
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(user_agent)?,
            timeout,
        })
    }

    /// Returns the per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches a URL and returns its body
    ///
    /// # Request Flow
    ///
    /// 1. Send GET, bounded by the per-request timeout
    /// 2. Follow redirects (max 10 hops)
    /// 3. Reject any final status outside 200-299
    /// 4. Read the body as text
    ///
    /// Both the request and the body read race `cancel`; whichever finishes
    /// first decides the outcome. There is no retry.
    ///
    /// # Arguments
    ///
    /// * `cancel` - Cancellation scope for this fetch
    /// * `url` - The URL to fetch
    pub async fn fetch(&self, cancel: &CancellationToken, url: &Url) -> Result<String, FetchError> {
        let cancelled = || FetchError::Cancelled {
            url: url.to_string(),
        };

        let request = self.client.get(url.clone()).timeout(self.timeout).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled()),
            result = request => result.map_err(|e| FetchError::from_reqwest(url, e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(cancelled()),
            body = response.text() => body.map_err(|e| FetchError::from_reqwest(url, e)),
        }
    }
}
