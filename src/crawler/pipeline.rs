//! Extraction and storage stage shared by the site crawl and the category
//! walk

use crate::config::FilterConfig;
use crate::crawler::fetcher::FetchedPage;
use crate::extract::{check_gates, extract_article, Rejection};
use crate::storage::{is_recently_crawled, upsert_document, DocumentCandidate, Storage, UpsertOutcome};
use chrono::{DateTime, Duration, Utc};

/// What happened to one candidate document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Written to (or refreshed in) the store
    Stored(UpsertOutcome),
    /// Crawled inside the recheck window; not re-extracted
    Recent,
    /// Extraction or a relevance gate said no
    Rejected(Rejection),
    /// The store failed for this document
    StorageFailed,
}

impl DocumentOutcome {
    /// Whether the document counts toward the article totals
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored(outcome) if outcome.is_stored())
    }
}

/// Runs candidates through the gates and into the store
pub struct DocumentPipeline {
    storage: Box<dyn Storage>,
    filter: FilterConfig,
    recheck_window: Duration,
}

impl DocumentPipeline {
    pub fn new(storage: Box<dyn Storage>, filter: FilterConfig, recheck_window: Duration) -> Self {
        Self {
            storage,
            filter,
            recheck_window,
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn filter(&self) -> &FilterConfig {
        &self.filter
    }

    /// Whether `url` was stored inside the recheck window
    ///
    /// A storage failure is logged and treated as "not recent".
    pub fn is_recent(&self, url: &str, now: DateTime<Utc>) -> bool {
        match is_recently_crawled(self.storage.as_ref(), url, now, self.recheck_window) {
            Ok(recent) => recent,
            Err(e) => {
                tracing::warn!("Could not look up {}: {}", url, e);
                false
            }
        }
    }

    /// Extracts an article from a fetched page and stores it
    pub fn process_page(
        &mut self,
        url: &str,
        page: &FetchedPage,
        source: &str,
        now: DateTime<Utc>,
    ) -> DocumentOutcome {
        if self.is_recent(url, now) {
            tracing::debug!("Skipping recently crawled {}", url);
            return DocumentOutcome::Recent;
        }

        let article = match extract_article(&page.body, &page.content_type, &self.filter) {
            Ok(article) => article,
            Err(rejection) => {
                tracing::debug!("Rejected {}: {}", url, rejection);
                return DocumentOutcome::Rejected(rejection);
            }
        };

        self.upsert(
            DocumentCandidate {
                url: url.to_string(),
                title: article.title,
                content: article.content,
                source: source.to_string(),
                page_id: None,
            },
            now,
        )
    }

    /// Gates and stores plain text obtained without HTML extraction
    pub fn process_text(
        &mut self,
        candidate: DocumentCandidate,
        now: DateTime<Utc>,
    ) -> DocumentOutcome {
        if let Err(rejection) = check_gates(&candidate.content, &self.filter) {
            tracing::debug!("Rejected {}: {}", candidate.url, rejection);
            return DocumentOutcome::Rejected(rejection);
        }

        let content = candidate.content.trim().to_string();
        self.upsert(DocumentCandidate { content, ..candidate }, now)
    }

    fn upsert(&mut self, candidate: DocumentCandidate, now: DateTime<Utc>) -> DocumentOutcome {
        match upsert_document(self.storage.as_mut(), &candidate, now, self.recheck_window) {
            Ok(outcome) => {
                match outcome {
                    UpsertOutcome::Inserted => tracing::info!(
                        "Added {} article: {} ({} words)",
                        candidate.source,
                        candidate.title.as_deref().unwrap_or(&candidate.url),
                        candidate.content.split_whitespace().count()
                    ),
                    UpsertOutcome::UpdatedContent => {
                        tracing::info!("Updated {} (content changed)", candidate.url)
                    }
                    UpsertOutcome::RefreshedTimestamp => {
                        tracing::debug!("Unchanged {}, refreshed timestamp", candidate.url)
                    }
                    UpsertOutcome::SkippedRecent => {
                        tracing::debug!("Skipping recently crawled {}", candidate.url)
                    }
                }
                DocumentOutcome::Stored(outcome)
            }
            Err(e) => {
                tracing::warn!("Could not store {}: {}", candidate.url, e);
                DocumentOutcome::StorageFailed
            }
        }
    }
}
