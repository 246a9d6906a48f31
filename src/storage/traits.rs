//! Storage traits and error types
//!
//! This module defines the trait interface for document stores and the
//! associated error types.

use crate::storage::{DocumentRecord, NewDocument, SourceStatistics};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Invalid timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document store implementations
///
/// The store is keyed by normalized URL. Writers are single-threaded, so the
/// check-then-write sequence in [`crate::storage::upsert_document`] needs no
/// locking of its own.
pub trait Storage {
    // ===== Document Lookup =====

    /// Gets a document by its normalized URL
    fn get_document(&self, url: &str) -> StorageResult<Option<DocumentRecord>>;

    /// Finds the URL of some document whose content has the given hash
    fn find_by_content_hash(&self, content_hash: &str) -> StorageResult<Option<String>>;

    // ===== Document Writes =====

    /// Inserts a new document with `update_count = 0`
    ///
    /// `first_crawled` and `last_crawled` are both set to `now`.
    fn insert_document(&mut self, document: &NewDocument, now: DateTime<Utc>) -> StorageResult<i64>;

    /// Replaces the content of an existing document
    ///
    /// Sets `last_modified` and `last_crawled` to `now` and increments
    /// `update_count` by one.
    fn update_document_content(
        &mut self,
        url: &str,
        title: &str,
        content: &str,
        content_hash: &str,
        word_count: u64,
        now: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Updates only `last_crawled` of an existing document
    fn touch_document(&mut self, url: &str, now: DateTime<Utc>) -> StorageResult<()>;

    // ===== Statistics =====

    /// Gets total document count
    fn count_documents(&self) -> StorageResult<u64>;

    /// Gets word-count statistics per source, largest source first
    fn source_statistics(&self) -> StorageResult<Vec<SourceStatistics>>;

    /// Counts documents last crawled before the given instant
    fn count_stale_documents(&self, before: DateTime<Utc>) -> StorageResult<u64>;
}
