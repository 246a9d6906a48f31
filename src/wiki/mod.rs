//! Encyclopedia lookups for the category walk
//!
//! The walk only needs two questions answered: which members does a
//! category have, and what is the plain text of a page. [`MediaWikiClient`]
//! answers them from the MediaWiki Action API.

mod mediawiki;

pub use mediawiki::MediaWikiClient;

use crate::CorpusError;
use async_trait::async_trait;

/// Plain-text page returned by the encyclopedia
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncyclopediaPage {
    pub title: String,
    pub page_id: i64,
    pub text: String,
}

/// Kind of a category member, from its namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Article,
    Category,
    Other,
}

impl MemberKind {
    /// Namespace 0 holds articles, namespace 14 categories
    pub fn from_namespace(ns: i64) -> Self {
        match ns {
            0 => Self::Article,
            14 => Self::Category,
            _ => Self::Other,
        }
    }
}

/// One entry of a category listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMember {
    pub title: String,
    pub page_id: i64,
    pub kind: MemberKind,
}

/// Source of category listings and page text
#[async_trait]
pub trait EncyclopediaClient: Send + Sync {
    /// Plain text of a page; `None` when the page does not exist
    async fn page(&self, title: &str) -> Result<Option<EncyclopediaPage>, CorpusError>;

    /// All members of a category, in listing order; empty when the category
    /// does not exist
    async fn category_members(&self, category: &str) -> Result<Vec<CategoryMember>, CorpusError>;
}

/// Article URL of a page title: spaces become underscores
///
/// ```
/// use fashion_corpus::wiki::article_url;
///
/// assert_eq!(
///     article_url("https://en.wikipedia.org/wiki/", "Little black dress"),
///     "https://en.wikipedia.org/wiki/Little_black_dress"
/// );
/// ```
pub fn article_url(base: &str, title: &str) -> String {
    format!("{}{}", base, title.replace(' ', "_"))
}
