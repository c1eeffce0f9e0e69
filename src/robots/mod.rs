//! Robots.txt handling module
//!
//! This module fetches a site's robots.txt once and compiles it into an
//! immutable [`RobotsPolicy`] shared by every crawl worker.

mod parser;

pub use parser::RobotsPolicy;

use crate::crawler::PageFetcher;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Fetches and compiles robots.txt for a site
///
/// Never fails: a missing, unreachable or non-2xx robots.txt yields
/// [`RobotsPolicy::allow_all`], and malformed content compiles to a policy
/// that allows whatever it cannot understand.
///
/// # Arguments
///
/// * `fetcher` - The fetcher to use (carries the request timeout)
/// * `base_url` - Any URL on the site; robots.txt is read from its root
/// * `cancel` - Cancellation scope for the fetch
pub async fn fetch_robots(
    fetcher: &PageFetcher,
    base_url: &Url,
    cancel: &CancellationToken,
) -> RobotsPolicy {
    let robots_url = match base_url.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL for {}: {}", base_url, e);
            return RobotsPolicy::allow_all();
        }
    };

    match fetcher.fetch(cancel, &robots_url).await {
        Ok(body) => {
            let policy = RobotsPolicy::from_content(&body);
            tracing::debug!(
                "Loaded robots.txt from {} ({} declared sitemaps)",
                robots_url,
                policy.sitemaps().len()
            );
            policy
        }
        Err(e) => {
            tracing::info!(
                "No usable robots.txt at {} ({}), allowing all paths",
                robots_url,
                e
            );
            RobotsPolicy::allow_all()
        }
    }
}
