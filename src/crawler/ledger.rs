use crate::url::Target;
use dashmap::DashSet;

/// Set of every Target admitted to crawling during one run
///
/// Insertion is a single check-and-set on a sharded map, so concurrent
/// workers discovering the same link never both win. Entries are never
/// removed.
#[derive(Debug, Default)]
pub struct DedupLedger {
    admitted: DashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `target` and returns true if this call was the first to do so
    pub fn try_admit(&self, target: &Target) -> bool {
        self.admitted.insert(target.as_str().to_string())
    }

    pub fn contains(&self, target: &Target) -> bool {
        self.admitted.contains(target.as_str())
    }

    /// Number of Targets admitted so far
    pub fn len(&self) -> usize {
        self.admitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admitted.is_empty()
    }
}
