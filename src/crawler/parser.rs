//! HTML link extraction
//!
//! Turns the anchors of a fetched page into canonical, in-site URLs ready
//! for the frontier.

use crate::url::{is_valid_url, normalize_url};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the crawlable links of a page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, resolved against the page URL
///
/// **Exclude:**
/// - Empty and fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Links leaving `base_domain`, non-HTTP(S) links and binary assets
///
/// Links are normalized and deduplicated; the result keeps the order in
/// which each link was first seen.
///
/// # Example
///
/// ```
/// use fashion_corpus::crawler::extract_links;
///
/// let html = r#"<a href="/fashion/a">A</a><a href="https://other.com/x">X</a>"#;
/// let links = extract_links(html, "https://www.vogue.com/fashion", "www.vogue.com");
/// assert_eq!(links, vec!["https://www.vogue.com/fashion/a".to_string()]);
/// ```
pub fn extract_links(html: &str, page_url: &str, base_domain: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };
    let page = Url::parse(page_url).ok();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(href) => href.trim(),
            None => continue,
        };

        let absolute = match resolve_link(href, page.as_ref()) {
            Some(absolute) => absolute,
            None => continue,
        };

        let normalized = normalize_url(&absolute, base_domain);
        if !is_valid_url(&normalized, base_domain) {
            tracing::trace!("Skipping link {}", normalized);
            continue;
        }

        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }

    links
}

/// Resolves an href against the page URL
///
/// Returns None for hrefs that never lead to a page. When the page URL
/// itself is unusable the href is passed through for the normalizer to
/// resolve against the site root.
fn resolve_link(href: &str, page: Option<&Url>) -> Option<String> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match page {
        Some(page) => page.join(href).ok().map(|url| url.to_string()),
        None => Some(href.to_string()),
    }
}
