use scraper::{ElementRef, Html, Selector};

/// Regions whose text never belongs to an article
const NOISE_SELECTOR: &str = "script, style, noscript, iframe, nav, footer, aside, header, \
     form, button, .ad, .advertisement, .social-share, .newsletter, .comments, .related-posts";

/// Structural selectors tried in order; class-name heuristics come last
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    r#"[role="main"]"#,
    ".article-content",
    ".post-content",
    ".entry-content",
    ".article-body",
    ".story-body",
    ".content-body",
    r#"[class*="article"]"#,
    r#"[class*="content"]"#,
    r#"[class*="post"]"#,
    r#"[class*="story"]"#,
];

/// Words a structural block needs to be accepted
pub const MIN_BLOCK_WORDS: usize = 100;

/// Paragraph fallback limits
const MAX_FALLBACK_PARAGRAPHS: usize = 20;
const MIN_PARAGRAPH_WORDS: usize = 10;

/// Finds the article body of a document
///
/// For each selector the match with the most visible text is taken; the
/// first one reaching [`MIN_BLOCK_WORDS`] wins. Otherwise the first 20
/// paragraphs with more than ten words are joined with single spaces. Text
/// inside navigation, ads, comments and similar regions is ignored, and
/// whitespace is collapsed. Returns `None` when nothing readable is found.
///
/// # Example
///
/// ```
/// use fashion_corpus::extract::resolve_content;
/// use scraper::Html;
///
/// let body = "silk ".repeat(120);
/// let html = format!("<html><body><nav>Menu</nav><article>{}</article></body></html>", body);
/// let content = resolve_content(&Html::parse_document(&html)).unwrap();
/// assert_eq!(content.split_whitespace().count(), 120);
/// ```
pub fn resolve_content(document: &Html) -> Option<String> {
    let noise = Selector::parse(NOISE_SELECTOR).ok();
    let mut last_candidate: Option<String> = None;

    for css in CONTENT_SELECTORS {
        let selector = match Selector::parse(css) {
            Ok(selector) => selector,
            Err(_) => continue,
        };

        let mut largest: Option<String> = None;
        for element in document.select(&selector) {
            let text = visible_text(element, noise.as_ref());
            if largest.as_ref().map_or(true, |l| text.len() > l.len()) {
                largest = Some(text);
            }
        }

        if let Some(text) = largest {
            if text.split_whitespace().count() >= MIN_BLOCK_WORDS {
                return Some(text);
            }
            last_candidate = Some(text);
        }
    }

    paragraph_fallback(document, noise.as_ref())
        .or(last_candidate)
        .filter(|text| !text.is_empty())
}

/// Joins the first qualifying paragraphs of the document
fn paragraph_fallback(document: &Html, noise: Option<&Selector>) -> Option<String> {
    let selector = Selector::parse("p").ok()?;

    let parts: Vec<String> = document
        .select(&selector)
        .map(|p| visible_text(p, noise))
        .filter(|text| text.split_whitespace().count() > MIN_PARAGRAPH_WORDS)
        .take(MAX_FALLBACK_PARAGRAPHS)
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Text of an element without noise regions, whitespace collapsed
fn visible_text(element: ElementRef<'_>, noise: Option<&Selector>) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in element.descendants() {
        let text = match node.value().as_text() {
            Some(text) => text,
            None => continue,
        };

        let hidden = noise.map_or(false, |noise| {
            node.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| noise.matches(&ancestor))
        });

        if !hidden {
            parts.push(text);
        }
    }

    parts
        .iter()
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize, word: &str) -> String {
        vec![word; n].join(" ")
    }

    fn content_of(html: &str) -> Option<String> {
        resolve_content(&Html::parse_document(html))
    }

    #[test]
    fn test_article_block_selected() {
        let body = words(150, "couture");
        let html = format!(
            "<html><body><div class='promo'>Buy now</div><article>{}</article></body></html>",
            body
        );
        assert_eq!(content_of(&html), Some(body));
    }

    #[test]
    fn test_largest_match_wins() {
        let small = words(110, "silk");
        let large = words(130, "wool");
        let html = format!(
            "<body><article>{}</article><article>{}</article></body>",
            small, large
        );
        assert_eq!(content_of(&html), Some(large));
    }

    #[test]
    fn test_noise_inside_block_ignored() {
        let body = words(120, "linen");
        let html = format!(
            "<body><article><script>var x = 1;</script>{}<div class='social-share'>Share this</div>\
             <aside>Related stories</aside></article></body>",
            body
        );
        assert_eq!(content_of(&html), Some(body));
    }

    #[test]
    fn test_class_heuristic_used_when_no_structure() {
        let body = words(105, "tailoring");
        let html = format!("<body><div class='story-text-wrapper'>{}</div></body>", body);
        assert_eq!(content_of(&html), Some(body));
    }

    #[test]
    fn test_paragraph_fallback_takes_first_twenty() {
        let paragraphs: Vec<String> = (0..25)
            .map(|i| format!("<p>paragraph{} {}</p>", i, words(11, "fabric")))
            .collect();
        let html = format!("<body><div>{}</div></body>", paragraphs.join(""));

        let content = content_of(&html).unwrap();
        let expected: Vec<String> = (0..20)
            .map(|i| format!("paragraph{} {}", i, words(11, "fabric")))
            .collect();
        assert_eq!(content, expected.join(" "));
    }

    #[test]
    fn test_short_paragraphs_skipped() {
        let long = words(12, "denim");
        let html = format!("<body><p>Too short to count.</p><p>{}</p></body>", long);
        assert_eq!(content_of(&html), Some(long));
    }

    #[test]
    fn test_paragraphs_in_noise_skipped() {
        let html = format!(
            "<body><footer><p>{}</p></footer></body>",
            words(15, "newsletter")
        );
        assert_eq!(content_of(&html), None);
    }

    #[test]
    fn test_small_block_kept_when_no_paragraphs() {
        let body = words(40, "velvet");
        let html = format!("<body><article>{}</article></body>", body);
        assert_eq!(content_of(&html), Some(body));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(content_of("<html><body></body></html>"), None);
    }
}
