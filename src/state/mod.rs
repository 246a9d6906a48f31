//! State module for tracking crawl progress
//!
//! This module provides the per-source progress records and the checkpoint
//! manager that persists them between runs.
//!
//! # Components
//!
//! - `CrawlerState`: Progress counters of one source (a site or Wikipedia)
//! - `CheckpointManager`: Owns the status map and persists it on every save
//! - `CheckpointStore`: Where the map is persisted (JSON file or memory)

mod checkpoint;
mod crawler_state;

// Re-export main types
pub use checkpoint::{
    CheckpointError, CheckpointManager, CheckpointStore, JsonCheckpointStore,
    MemoryCheckpointStore,
};
pub use crawler_state::{CheckpointFile, CrawlerState, CHECKPOINT_VERSION};
