//! Storage module for persisting the corpus
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Document lookup by URL and by content hash
//! - Dedup-aware upserts with recheck-window gating
//! - Per-source statistics for reports

pub mod dedup;
mod schema;
mod sqlite;
mod traits;

pub use dedup::{
    content_hash, is_recently_crawled, upsert_document, word_count, DocumentCandidate,
    UpsertOutcome,
};
pub use sqlite::{format_timestamp, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::CorpusError;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens the corpus database
///
/// Failing here is fatal for a crawl run; every later storage error is
/// scoped to one document.
pub fn open_storage(path: &Path) -> Result<SqliteStorage, CorpusError> {
    SqliteStorage::new(path)
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub content_hash: String,
    pub source: String,
    pub word_count: u64,
    pub first_crawled: DateTime<Utc>,
    pub last_crawled: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
    pub update_count: u32,
    pub page_id: Option<i64>,
}

/// Fields of a document about to be inserted
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub url: String,
    pub title: String,
    pub content: String,
    pub content_hash: String,
    pub source: String,
    pub word_count: u64,
    pub page_id: Option<i64>,
}

/// Word-count statistics of one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatistics {
    pub source: String,
    pub document_count: u64,
    pub total_words: u64,
    pub min_words: u64,
    pub max_words: u64,
}

impl SourceStatistics {
    pub fn avg_words(&self) -> f64 {
        if self.document_count == 0 {
            0.0
        } else {
            self.total_words as f64 / self.document_count as f64
        }
    }
}
