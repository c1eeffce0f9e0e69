//! Processor trait and associated error type
//!
//! Processors receive every successfully fetched page. They run in the
//! post-process worker pool, decoupled from the crawl that produced the page.

use crate::url::Target;
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors a processor can report
///
/// The crawler logs these and moves on; they never affect the crawl itself
/// or other processors.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Processing failed: {0}")]
    Failed(String),

    #[error("Processing cancelled")]
    Cancelled,
}

/// Result type for processor operations
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// A pluggable consumer of fetched pages
///
/// Called exactly once per (page, processor) pair for every page fetched
/// with a 2xx status. Implementations must be safe to call concurrently,
/// both for different pages and alongside other processors.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Returns the processor's name, used in log lines
    fn name(&self) -> &str;

    /// Processes one fetched page
    ///
    /// # Arguments
    ///
    /// * `cancel` - The crawl's cancellation scope
    /// * `page` - The page's canonical Target
    /// * `content` - The raw response body
    async fn process(
        &self,
        cancel: &CancellationToken,
        page: &Target,
        content: &str,
    ) -> ProcessingResult<()>;
}
