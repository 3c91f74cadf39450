// src/utils/url.rs

//! URL and site-relative path helpers.

use url::Url;

use crate::error::{AppError, Result};

/// Build an absolute URL from a site base URL and a site-relative path.
///
/// # Examples
/// ```
/// use site_search::utils::url::join;
///
/// let url = join("https://example.com", "/docs/intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/intro");
/// ```
pub fn join(base_url: &str, path: &str) -> Result<Url> {
    let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
    Url::parse(&raw).map_err(|e| AppError::malformed_url(format!("{raw}: {e}")))
}

/// Path key of `url` within the site at `base_url`, "/" for the base itself.
///
/// The key is built like the crawler's: query and fragment dropped, path
/// lower-cased, trailing slash removed. Returns `None` when `url` is not on
/// the base URL's scheme, host and port.
///
/// # Examples
/// ```
/// use site_search::utils::url::relative_path;
///
/// assert_eq!(relative_path("https://example.com", "https://example.com"), Some("/".into()));
/// assert_eq!(relative_path("https://example.com", "https://example.com/A/b/?x=1"), Some("/a/b".into()));
/// assert_eq!(relative_path("https://example.com", "https://other.org/a"), None);
/// ```
pub fn relative_path(base_url: &str, url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let target = Url::parse(url).ok()?;
    if target.scheme() != base.scheme()
        || target.host_str() != base.host_str()
        || target.port_or_known_default() != base.port_or_known_default()
    {
        return None;
    }

    let path = target.path().to_lowercase();
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        return Some("/".to_string());
    }
    Some(path.to_string())
}

/// Normalize an anchor `href` found on `page` into a crawlable site path.
///
/// The href is resolved against the page URL, must stay on the same host
/// over http(s), and loses its query and fragment. The path is lower-cased
/// and stripped of a trailing slash. Paths pointing at files other than
/// `.html`/`.htm` documents are rejected, as is the site root.
pub fn normalize_link(page: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let target = page.join(href).ok()?;
    if !matches!(target.scheme(), "http" | "https") {
        return None;
    }
    if target.host_str() != page.host_str() || target.port_or_known_default() != page.port_or_known_default() {
        return None;
    }

    let path = target.path().to_lowercase();
    let path = path.trim_end_matches('/');
    if path.is_empty() || !is_document_path(path) {
        return None;
    }
    Some(path.to_string())
}

/// A path is crawlable when it has no dots, commas or whitespace, except
/// for an optional trailing `.html` or `.htm`.
fn is_document_path(path: &str) -> bool {
    let stem = path
        .strip_suffix(".html")
        .or_else(|| path.strip_suffix(".htm"))
        .unwrap_or(path);

    !stem.is_empty()
        && !stem
            .chars()
            .any(|c| c == '.' || c == ',' || c == '"' || c.is_whitespace())
}
