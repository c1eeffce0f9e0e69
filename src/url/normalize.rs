use crate::url::Target;
use crate::UrlError;
use url::Url;

/// Resolves an href against a base URL and cleans the result into a [`Target`]
///
/// # Cleaning Steps
///
/// 1. Parse the href; absolute hrefs are taken as-is, relative ones are
///    resolved against `base`
/// 2. Reject anything that is not HTTP(S) or has no host
/// 3. Remove the fragment (everything after #)
/// 4. Normalize the path:
///    - Collapse repeated slashes
///    - Remove dot segments (. and ..)
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
///
/// The query string is kept verbatim.
///
/// # Arguments
///
/// * `base` - The URL relative hrefs are resolved against
/// * `href` - The raw href, as found in a page or sitemap
///
/// # Returns
///
/// * `Ok(Target)` - The cleaned absolute URL
/// * `Err(UrlError)` - The href could not be parsed or is not crawlable
///
/// # Examples
///
/// ```
/// use sitewalker::url::resolve_and_clean;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let target = resolve_and_clean(&base, "../about//team/#people").unwrap();
/// assert_eq!(target.as_str(), "https://example.com/about/team");
/// ```
pub fn resolve_and_clean(base: &Url, href: &str) -> Result<Target, UrlError> {
    let resolved = base
        .join(href.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    clean_url(resolved)
}

/// Cleans an already absolute URL into a [`Target`]
pub(crate) fn clean_url(mut url: Url) -> Result<Target, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    let cleaned = clean_path(url.path());
    url.set_path(&cleaned);

    Ok(Target::from_clean(url))
}

/// Collapses repeated slashes and resolves dot segments in a URL path
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}
