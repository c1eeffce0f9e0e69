use url::Url;

/// Extracts the host of a URL, lowercased
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitewalker::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether two URLs address the same host
///
/// Hosts compare case-insensitively together with any explicitly written
/// port. The scheme is not part of the host, so `http://example.com/about`
/// belongs to `https://example.com/`, while `http://127.0.0.1:8080` and
/// `http://127.0.0.1:9090` differ. A port equal to the scheme default is
/// dropped during parsing, so `https://example.com:443` matches too.
/// Subdomains are distinct hosts.
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_host(a), extract_host(b)) {
        (Some(host_a), Some(host_b)) => host_a == host_b && a.port() == b.port(),
        _ => false,
    }
}
