//! Sitemap XML parsing

use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Cursor;
use thiserror::Error;

/// Sitemap parsing failure
#[derive(Debug, Error)]
pub enum SitemapError {
    /// The document is not well-formed XML
    #[error("Malformed sitemap XML: {0}")]
    Parse(String),
}

/// Parses a `<urlset>` sitemap and returns every `<url><loc>` it lists
///
/// Entries without a usable location are omitted. Nested `<sitemap>` entries
/// of a sitemap index are skipped; only page locations are returned.
///
/// # Errors
///
/// Returns [`SitemapError::Parse`] on the first XML error. Locations read
/// before the error are discarded.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, SitemapError> {
    let mut locations = Vec::new();

    for entity in SiteMapReader::new(Cursor::new(xml.as_bytes())) {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    locations.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    tracing::debug!("Skipping nested sitemap {}", url);
                }
            }
            // The underlying XML reader repeats its last error forever
            SiteMapEntity::Err(e) => return Err(SitemapError::Parse(e.to_string())),
        }
    }

    Ok(locations)
}
