//! Database schema definitions
//!
//! This module contains the SQL schema for the corpus database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per stored article, keyed by normalized URL
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    source TEXT NOT NULL,
    word_count INTEGER NOT NULL,
    first_crawled TEXT NOT NULL,
    last_crawled TEXT NOT NULL,
    last_modified TEXT,
    update_count INTEGER NOT NULL DEFAULT 0,
    page_id INTEGER
);

CREATE INDEX IF NOT EXISTS idx_documents_content_hash ON documents(content_hash);
CREATE INDEX IF NOT EXISTS idx_documents_last_crawled ON documents(last_crawled);
CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
