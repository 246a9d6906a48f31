//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{DocumentRecord, NewDocument, SourceStatistics};
use crate::CorpusError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const DOCUMENT_COLUMNS: &str = "id, url, title, content, content_hash, source, word_count,
     first_crawled, last_crawled, last_modified, update_count, page_id";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the corpus database at `path`
    pub fn new(path: &Path) -> Result<Self, CorpusError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, CorpusError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Formats a timestamp the way it is stored: fixed-width RFC 3339, UTC
///
/// The fixed width keeps lexicographic order equal to time order, which the
/// stale-document query relies on.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidTimestamp {
            value: value.to_string(),
            message: e.to_string(),
        })
}

/// Columns of a document row before timestamp parsing
struct RawDocument {
    id: i64,
    url: String,
    title: String,
    content: String,
    content_hash: String,
    source: String,
    word_count: i64,
    first_crawled: String,
    last_crawled: String,
    last_modified: Option<String>,
    update_count: i64,
    page_id: Option<i64>,
}

impl RawDocument {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            content_hash: row.get(4)?,
            source: row.get(5)?,
            word_count: row.get(6)?,
            first_crawled: row.get(7)?,
            last_crawled: row.get(8)?,
            last_modified: row.get(9)?,
            update_count: row.get(10)?,
            page_id: row.get(11)?,
        })
    }

    fn into_record(self) -> StorageResult<DocumentRecord> {
        Ok(DocumentRecord {
            id: self.id,
            url: self.url,
            title: self.title,
            content: self.content,
            content_hash: self.content_hash,
            source: self.source,
            word_count: self.word_count.max(0) as u64,
            first_crawled: parse_timestamp(&self.first_crawled)?,
            last_crawled: parse_timestamp(&self.last_crawled)?,
            last_modified: self
                .last_modified
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            update_count: self.update_count.max(0) as u32,
            page_id: self.page_id,
        })
    }
}

impl Storage for SqliteStorage {
    // ===== Document Lookup =====

    fn get_document(&self, url: &str) -> StorageResult<Option<DocumentRecord>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {} FROM documents WHERE url = ?1", DOCUMENT_COLUMNS),
                params![url],
                RawDocument::from_row,
            )
            .optional()?;

        raw.map(RawDocument::into_record).transpose()
    }

    fn find_by_content_hash(&self, content_hash: &str) -> StorageResult<Option<String>> {
        let url = self
            .conn
            .query_row(
                "SELECT url FROM documents WHERE content_hash = ?1 LIMIT 1",
                params![content_hash],
                |row| row.get(0),
            )
            .optional()?;
        Ok(url)
    }

    // ===== Document Writes =====

    fn insert_document(&mut self, document: &NewDocument, now: DateTime<Utc>) -> StorageResult<i64> {
        let now = format_timestamp(now);
        self.conn.execute(
            "INSERT INTO documents (url, title, content, content_hash, source, word_count,
             first_crawled, last_crawled, update_count, page_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, 0, ?8)",
            params![
                document.url,
                document.title,
                document.content,
                document.content_hash,
                document.source,
                document.word_count as i64,
                now,
                document.page_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_document_content(
        &mut self,
        url: &str,
        title: &str,
        content: &str,
        content_hash: &str,
        word_count: u64,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        let now = format_timestamp(now);
        let changed = self.conn.execute(
            "UPDATE documents
             SET title = ?1, content = ?2, content_hash = ?3, word_count = ?4,
                 last_modified = ?5, last_crawled = ?5, update_count = update_count + 1
             WHERE url = ?6",
            params![title, content, content_hash, word_count as i64, now, url],
        )?;

        if changed == 0 {
            return Err(StorageError::DocumentNotFound(url.to_string()));
        }
        Ok(())
    }

    fn touch_document(&mut self, url: &str, now: DateTime<Utc>) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE documents SET last_crawled = ?1 WHERE url = ?2",
            params![format_timestamp(now), url],
        )?;

        if changed == 0 {
            return Err(StorageError::DocumentNotFound(url.to_string()));
        }
        Ok(())
    }

    // ===== Statistics =====

    fn count_documents(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn source_statistics(&self) -> StorageResult<Vec<SourceStatistics>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, COUNT(*), SUM(word_count), MIN(word_count), MAX(word_count)
             FROM documents
             GROUP BY source
             ORDER BY COUNT(*) DESC, source ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(SourceStatistics {
                source: row.get(0)?,
                document_count: row.get::<_, i64>(1)? as u64,
                total_words: row.get::<_, i64>(2)? as u64,
                min_words: row.get::<_, i64>(3)? as u64,
                max_words: row.get::<_, i64>(4)? as u64,
            })
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }

        Ok(stats)
    }

    fn count_stale_documents(&self, before: DateTime<Utc>) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE last_crawled < ?1",
            params![format_timestamp(before)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
