use crate::url::Target;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A Target waiting to be fetched
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub target: Target,
    pub scope: CancellationToken,
}

/// One (page, processor) pair waiting to be processed
///
/// All tasks for the same page share one copy of its content.
#[derive(Debug, Clone)]
pub struct ProcessTask {
    pub target: Target,
    pub content: Arc<str>,
    pub processor_index: usize,
    pub scope: CancellationToken,
}
