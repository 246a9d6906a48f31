//! Dedup-aware document upsert
//!
//! Documents are keyed by URL. A SHA-256 digest of the content decides
//! whether a re-crawled page changed, so repeated runs only rewrite what
//! actually moved, and `update_count` counts real edits.

use crate::extract::title_from_url;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::NewDocument;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// An accepted article on its way into the store
#[derive(Debug, Clone)]
pub struct DocumentCandidate {
    pub url: String,
    pub title: Option<String>,
    pub content: String,
    pub source: String,
    pub page_id: Option<i64>,
}

/// What an upsert did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New document written
    Inserted,
    /// Existing document with different content rewritten
    UpdatedContent,
    /// Existing document with identical content; only `last_crawled` moved
    RefreshedTimestamp,
    /// Existing document crawled inside the recheck window; nothing written
    SkippedRecent,
}

impl UpsertOutcome {
    /// Whether the candidate counts as a processed article
    pub fn is_stored(&self) -> bool {
        !matches!(self, Self::SkippedRecent)
    }
}

/// Stable hex digest of document content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whitespace-separated word count
pub fn word_count(content: &str) -> u64 {
    content.split_whitespace().count() as u64
}

/// Checks whether `url` was crawled less than `recheck_window` ago
///
/// Callers use this before fetching or extracting so that no work is spent
/// on documents the upsert would skip anyway.
pub fn is_recently_crawled<S: Storage + ?Sized>(
    storage: &S,
    url: &str,
    now: DateTime<Utc>,
    recheck_window: Duration,
) -> StorageResult<bool> {
    Ok(storage
        .get_document(url)?
        .map(|doc| now - doc.last_crawled < recheck_window)
        .unwrap_or(false))
}

/// Inserts or refreshes a document
///
/// | Stored document            | Result                 |
/// |----------------------------|------------------------|
/// | none                       | `Inserted`             |
/// | crawled inside the window  | `SkippedRecent`        |
/// | same content hash          | `RefreshedTimestamp`   |
/// | different content hash     | `UpdatedContent`       |
pub fn upsert_document<S: Storage + ?Sized>(
    storage: &mut S,
    candidate: &DocumentCandidate,
    now: DateTime<Utc>,
    recheck_window: Duration,
) -> StorageResult<UpsertOutcome> {
    let hash = content_hash(&candidate.content);

    let existing = match storage.get_document(&candidate.url)? {
        Some(existing) => existing,
        None => {
            if let Some(other) = storage.find_by_content_hash(&hash)? {
                tracing::debug!(
                    "Content of {} duplicates already stored {}",
                    candidate.url,
                    other
                );
            }

            let title = candidate
                .title
                .clone()
                .unwrap_or_else(|| title_from_url(&candidate.url));

            storage.insert_document(
                &NewDocument {
                    url: candidate.url.clone(),
                    title,
                    content: candidate.content.clone(),
                    content_hash: hash,
                    source: candidate.source.clone(),
                    word_count: word_count(&candidate.content),
                    page_id: candidate.page_id,
                },
                now,
            )?;
            return Ok(UpsertOutcome::Inserted);
        }
    };

    if now - existing.last_crawled < recheck_window {
        return Ok(UpsertOutcome::SkippedRecent);
    }

    if existing.content_hash == hash {
        storage.touch_document(&candidate.url, now)?;
        return Ok(UpsertOutcome::RefreshedTimestamp);
    }

    let title = candidate.title.as_deref().unwrap_or(&existing.title);
    storage.update_document_content(
        &candidate.url,
        title,
        &candidate.content,
        &hash,
        word_count(&candidate.content),
        now,
    )?;
    Ok(UpsertOutcome::UpdatedContent)
}
