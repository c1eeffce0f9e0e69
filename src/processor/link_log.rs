use super::{ProcessingError, ProcessingResult, Processor};
use crate::crawler::extract_links;
use crate::url::Target;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

/// What the link log remembers about one processed page
#[derive(Debug, Clone)]
pub struct CrawledPage {
    /// Raw hrefs found on the page, in document order
    pub links: Vec<String>,

    /// When the page was processed
    pub processed_at: DateTime<Utc>,
}

/// Built-in processor recording every page and the links it contains
#[derive(Debug, Default)]
pub struct LinkLogProcessor {
    pages: DashMap<String, CrawledPage>,
    pages_processed: AtomicU64,
    links_found: AtomicU64,
}

impl LinkLogProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages processed so far
    pub fn pages_processed(&self) -> u64 {
        self.pages_processed.load(Ordering::Relaxed)
    }

    /// Total links found across all processed pages
    pub fn links_found(&self) -> u64 {
        self.links_found.load(Ordering::Relaxed)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    /// Returns the links recorded for `url`, if that page was processed
    pub fn links_for(&self, url: &str) -> Option<Vec<String>> {
        self.pages.get(url).map(|entry| entry.links.clone())
    }

    /// Returns a snapshot of every recorded page, sorted by URL
    pub fn pages(&self) -> Vec<(String, CrawledPage)> {
        let mut pages: Vec<_> = self
            .pages
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        pages.sort_by(|a, b| a.0.cmp(&b.0));
        pages
    }
}

#[async_trait]
impl Processor for LinkLogProcessor {
    fn name(&self) -> &str {
        "link-log"
    }

    async fn process(
        &self,
        cancel: &CancellationToken,
        page: &Target,
        content: &str,
    ) -> ProcessingResult<()> {
        if cancel.is_cancelled() {
            return Err(ProcessingError::Cancelled);
        }

        let links = extract_links(content);
        let link_count = links.len() as u64;

        self.pages.insert(
            page.as_str().to_string(),
            CrawledPage {
                links,
                processed_at: Utc::now(),
            },
        );
        self.pages_processed.fetch_add(1, Ordering::Relaxed);
        self.links_found.fetch_add(link_count, Ordering::Relaxed);

        tracing::debug!("Logged {} links from {}", link_count, page);
        Ok(())
    }
}
