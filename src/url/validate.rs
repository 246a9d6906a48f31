use crate::url::domain::url_authority;
use url::Url;

/// Path suffixes that never lead to an article
const BLOCKED_EXTENSIONS: &[&str] = &[
    // images
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico",
    // documents and archives
    ".pdf", ".zip", ".gz", ".rar", ".tar",
    // media
    ".mp4", ".mp3", ".avi", ".mov", ".wav",
    // stylesheets, scripts and fonts
    ".css", ".js", ".woff", ".woff2",
];

/// Path fragments that mark article pages on any fashion site
const GENERIC_ARTICLE_FRAGMENTS: &[&str] = &[
    "/article/",
    "/story/",
    "/news/",
    "/blog/",
    "/post/",
    "/fashion/",
    "/style/",
    "/trends/",
    "/collection/",
    "/runway/",
    "/designer/",
    "/couture/",
    "/lookbook/",
];

/// Checks whether a URL may be crawled as part of a site
///
/// A URL without a host is accepted: it is assumed to be a same-site
/// reference that was already resolved upstream. Otherwise the authority
/// must contain `base_domain`, the scheme must be http(s) and the path must
/// not end in a static-asset extension.
///
/// # Examples
///
/// ```
/// use fashion_corpus::url::is_valid_url;
///
/// assert!(is_valid_url("https://www.vogue.com/article/x", "www.vogue.com"));
/// assert!(!is_valid_url("https://www.elle.com/article/x", "www.vogue.com"));
/// assert!(!is_valid_url("https://www.vogue.com/look.jpg", "www.vogue.com"));
/// ```
pub fn is_valid_url(url: &str, base_domain: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return true,
    };

    let authority = match url_authority(&parsed) {
        Some(authority) => authority,
        None => return true,
    };

    if !authority.contains(&base_domain.to_lowercase()) {
        return false;
    }

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    let path = parsed.path().to_lowercase();
    !BLOCKED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Checks whether a URL looks like an article page
///
/// Matches the site's own patterns or the generic list of article path
/// fragments, case-insensitively.
pub fn is_article_url(url: &str, site_patterns: &[String]) -> bool {
    let url_lower = url.to_lowercase();

    site_patterns
        .iter()
        .any(|pattern| url_lower.contains(&pattern.to_lowercase()))
        || GENERIC_ARTICLE_FRAGMENTS
            .iter()
            .any(|fragment| url_lower.contains(fragment))
}
