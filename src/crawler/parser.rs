//! HTML link extraction
//!
//! Pulls raw href values out of page markup. Resolution against the site and
//! normalization happen later, in [`crate::url::resolve_and_clean`], so the
//! strings returned here are exactly as they appear in the document.

use scraper::{Html, Selector};

/// Extracts the raw href of every followable anchor in a page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Empty and fragment-only hrefs (same page anchors)
///
/// Malformed markup never fails: the HTML parser recovers and whatever
/// anchors it found are returned, possibly none.
///
/// # Example
///
/// ```
/// use sitewalker::crawler::extract_links;
///
/// let html = r#"<html><body><a href="/page">Link</a><a href="mailto:x@y.z">Mail</a></body></html>"#;
/// assert_eq!(extract_links(html), vec!["/page".to_string()]);
/// ```
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_followable(href))
        .map(str::to_string)
        .collect()
}

/// Returns false for hrefs that can never name a crawlable page
fn is_followable(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return false;
    }

    let lower = href.to_ascii_lowercase();
    !(lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:"))
}
