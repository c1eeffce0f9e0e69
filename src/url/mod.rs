//! URL handling module for SiteWalker
//!
//! This module provides the [`Target`] crawl unit, href resolution and
//! cleaning, and host comparison.

mod domain;
mod normalize;

use crate::UrlError;
use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_host, same_host};
pub use normalize::resolve_and_clean;

/// A cleaned absolute URL identifying one crawl unit
///
/// Targets are only built through [`resolve_and_clean`] or [`Target::parse`],
/// so the fragment is always gone and the path is always normalized. Two hrefs
/// that clean to the same string are the same crawl unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(Url);

impl Target {
    /// Parses and cleans an absolute URL string
    ///
    /// # Examples
    ///
    /// ```
    /// use sitewalker::url::Target;
    ///
    /// let target = Target::parse("https://example.com//blog/#latest").unwrap();
    /// assert_eq!(target.as_str(), "https://example.com/blog");
    /// ```
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let url = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
        normalize::clean_url(url)
    }

    /// Wraps a URL that has already been cleaned
    pub(crate) fn from_clean(url: Url) -> Self {
        Self(url)
    }

    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying URL
    pub fn url(&self) -> &Url {
        &self.0
    }

    /// Returns the path plus query, as robots.txt rules are matched against
    pub fn path_and_query(&self) -> String {
        match self.0.query() {
            Some(query) => format!("{}?{}", self.0.path(), query),
            None => self.0.path().to_string(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<Target> for Url {
    fn from(target: Target) -> Self {
        target.0
    }
}
