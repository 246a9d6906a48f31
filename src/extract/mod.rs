//! Article extraction and topical classification
//!
//! Turns a fetched HTML page into plain article text plus an optional title,
//! and decides whether the text is long enough and on-topic enough to keep.
//! Every failure is soft: the caller gets a [`Rejection`] and moves on.

mod classify;
mod content;
mod title;

pub use classify::{check_gates, keyword_hits};
pub use content::{resolve_content, MIN_BLOCK_WORDS};
pub use title::{extract_title, title_from_url};

use crate::config::FilterConfig;
use scraper::Html;
use thiserror::Error;

/// Text and title of an accepted article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: Option<String>,
    pub content: String,
    pub word_count: usize,
}

/// Why a page was not accepted as an article
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("content type {0:?} is not HTML")]
    NotHtml(String),

    #[error("no readable content")]
    NoContent,

    #[error("{words} words, need {required}")]
    TooShort { words: usize, required: usize },

    #[error("{hits} topic keywords, need {required}")]
    OffTopic { hits: usize, required: usize },
}

/// Whether a Content-Type header announces HTML
pub fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("text/html")
}

/// Extracts and classifies an HTML page
///
/// The title is read from the raw document; content resolution ignores
/// navigation, ads and other noise. The returned content is trimmed.
pub fn extract_article(
    html: &str,
    content_type: &str,
    filter: &FilterConfig,
) -> Result<ExtractedArticle, Rejection> {
    if !is_html(content_type) {
        return Err(Rejection::NotHtml(content_type.to_string()));
    }

    let document = Html::parse_document(html);
    let title = extract_title(&document);
    let content = resolve_content(&document).ok_or(Rejection::NoContent)?;
    let word_count = check_gates(&content, filter)?;

    Ok(ExtractedArticle {
        title,
        content: content.trim().to_string(),
        word_count,
    })
}
