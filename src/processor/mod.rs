//! Page processors
//!
//! This module defines the [`Processor`] seam the post-process stage calls
//! into, and ships the built-in [`LinkLogProcessor`] used by the CLI.

mod link_log;
mod traits;

pub use link_log::{CrawledPage, LinkLogProcessor};
pub use traits::{ProcessingError, ProcessingResult, Processor};
