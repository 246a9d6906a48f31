//! Corpus statistics from the document store
//!
//! This module aggregates word counts per source and writes them as the
//! `corpus_statistics.json` document.

use crate::output::OutputResult;
use crate::storage::{SourceStatistics, Storage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Word-count summary of one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub count: u64,
    pub total_words: u64,
    pub avg_words: f64,
    pub min_words: u64,
    pub max_words: u64,
}

impl From<&SourceStatistics> for SourceSummary {
    fn from(stats: &SourceStatistics) -> Self {
        Self {
            source: stats.source.clone(),
            count: stats.document_count,
            total_words: stats.total_words,
            avg_words: stats.avg_words(),
            min_words: stats.min_words,
            max_words: stats.max_words,
        }
    }
}

/// Corpus statistics summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusStatistics {
    /// Total number of stored documents
    pub total_documents: u64,

    /// Sum of word counts over all documents
    pub total_words: u64,

    /// `total_words / total_documents`
    pub avg_words_per_doc: f64,

    /// Per-source summaries, largest source first
    pub sources: Vec<SourceSummary>,

    /// Documents last crawled before the recheck window began
    pub stale_documents: u64,

    pub generated_at: DateTime<Utc>,
}

/// Loads statistics from storage
///
/// Returns `None` when the corpus is empty. `stale_before` is the instant
/// before which a document counts as stale.
pub fn load_statistics(
    storage: &dyn Storage,
    stale_before: DateTime<Utc>,
    now: DateTime<Utc>,
) -> OutputResult<Option<CorpusStatistics>> {
    let total_documents = storage.count_documents()?;
    if total_documents == 0 {
        tracing::warn!("Corpus is empty");
        return Ok(None);
    }

    let sources: Vec<SourceSummary> = storage
        .source_statistics()?
        .iter()
        .map(SourceSummary::from)
        .collect();
    let total_words = sources.iter().map(|s| s.total_words).sum::<u64>();

    Ok(Some(CorpusStatistics {
        total_documents,
        total_words,
        avg_words_per_doc: total_words as f64 / total_documents as f64,
        sources,
        stale_documents: storage.count_stale_documents(stale_before)?,
        generated_at: now,
    }))
}

/// Writes statistics as pretty-printed JSON
pub fn write_statistics_json(stats: &CorpusStatistics, output_path: &Path) -> OutputResult<()> {
    let json = serde_json::to_string_pretty(stats)?;

    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;

    tracing::debug!("Wrote statistics to {}", output_path.display());
    Ok(())
}
