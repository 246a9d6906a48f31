use crate::url::url_authority;
use scraper::{Html, Selector};
use url::Url;

/// Title candidates, most specific first
const TITLE_SELECTORS: &[&str] = &[
    "h1.article-title",
    "h1.post-title",
    "h1.entry-title",
    "h1",
    r#"meta[property="og:title"]"#,
    r#"meta[name="twitter:title"]"#,
    "title",
];

/// A candidate must be longer than this to count as a title
const MIN_TITLE_CHARS: usize = 10;

/// Extracts the article title from the raw document
///
/// The first element of each selector is considered in turn; meta tags
/// contribute their `content` attribute. The first candidate longer than
/// ten characters wins.
pub fn extract_title(document: &Html) -> Option<String> {
    for css in TITLE_SELECTORS {
        let selector = match Selector::parse(css) {
            Ok(selector) => selector,
            Err(_) => continue,
        };

        let element = match document.select(&selector).next() {
            Some(element) => element,
            None => continue,
        };

        let candidate = if element.value().name() == "meta" {
            element.value().attr("content").unwrap_or("").to_string()
        } else {
            element.text().collect::<Vec<_>>().join(" ")
        };
        let candidate = candidate.split_whitespace().collect::<Vec<_>>().join(" ");

        if candidate.chars().count() > MIN_TITLE_CHARS {
            return Some(candidate);
        }
    }

    None
}

/// Derives a readable title from the last path segment of a URL
///
/// `/article/spring-couture-week` becomes "Spring Couture Week". Slugs of a
/// single word say too little and fall back to "Article from {host}".
pub fn title_from_url(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return "Fashion article".to_string(),
    };

    let last_segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last());

    if let Some(segment) = last_segment {
        let slug = segment.replace(['-', '_'], " ");
        let words: Vec<&str> = slug.split_whitespace().collect();
        if words.len() > 1 {
            return words.iter().map(|w| capitalize(w)).collect::<Vec<_>>().join(" ");
        }
    }

    format!("Article from {}", url_authority(&parsed).unwrap_or_default())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
