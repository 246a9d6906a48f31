use crate::url::domain::url_authority;
use url::{ParseError, Url};

/// Normalizes a URL to the canonical form used as the visited/store key
///
/// # Normalization Steps
///
/// 1. Parse the URL; a reference without a host is resolved against
///    `https://{base_domain}`
/// 2. Keep scheme, lowercase host and non-default port
/// 3. Strip every trailing slash from the path (the root path becomes empty)
/// 4. Drop the query string and the fragment
///
/// Anything that cannot be resolved is returned unchanged, so the caller's
/// validity check decides what to do with it. Normalizing an already
/// normalized URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use fashion_corpus::url::normalize_url;
///
/// let url = normalize_url("https://www.vogue.com/fashion/?page=2#top", "www.vogue.com");
/// assert_eq!(url, "https://www.vogue.com/fashion");
///
/// let url = normalize_url("/runway/", "www.vogue.com");
/// assert_eq!(url, "https://www.vogue.com/runway");
/// ```
pub fn normalize_url(url: &str, base_domain: &str) -> String {
    match resolve(url.trim(), base_domain) {
        Some(resolved) => canonical_string(&resolved),
        None => {
            tracing::debug!("Could not normalize URL {}", url);
            url.to_string()
        }
    }
}

/// Resolves a possibly relative reference into an absolute URL with a host
fn resolve(url: &str, base_domain: &str) -> Option<Url> {
    match Url::parse(url) {
        Ok(parsed) if parsed.host_str().is_some() => Some(parsed),
        Ok(_) => None,
        Err(ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(&format!("https://{}/", base_domain)).ok()?;
            base.join(url).ok().filter(|u| u.host_str().is_some())
        }
        Err(_) => None,
    }
}

/// Builds `scheme://authority/path` without trailing slashes, query or fragment
fn canonical_string(url: &Url) -> String {
    let authority = url_authority(url).unwrap_or_default();
    let path = url.path().trim_end_matches('/');
    format!("{}://{}{}", url.scheme(), authority, path)
}
