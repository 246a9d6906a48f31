//! Output module for corpus statistics and reports
//!
//! This module handles:
//! - Aggregating per-source word counts from the store
//! - Writing `corpus_statistics.json`
//! - Formatting, printing and writing the text report

mod report;
pub mod stats;

pub use report::{format_text_report, print_report, write_text_report};
pub use stats::{load_statistics, write_statistics_json, CorpusStatistics, SourceSummary};

use crate::config::Config;
use crate::storage::{Storage, StorageError};
use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize statistics: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Regenerates the statistics file and the text report, and prints the
/// report
///
/// Returns `None` without writing anything when the corpus is empty.
pub fn generate_statistics(
    storage: &dyn Storage,
    config: &Config,
    now: DateTime<Utc>,
) -> OutputResult<Option<CorpusStatistics>> {
    let stale_before = now - config.crawler.recheck_window();
    let stats = match load_statistics(storage, stale_before, now)? {
        Some(stats) => stats,
        None => return Ok(None),
    };

    write_statistics_json(&stats, Path::new(&config.output.statistics_path))?;
    write_text_report(&stats, Path::new(&config.output.report_path))?;
    print_report(&stats);

    tracing::info!(
        "Statistics written to {} and {}",
        config.output.statistics_path,
        config.output.report_path
    );
    Ok(Some(stats))
}
