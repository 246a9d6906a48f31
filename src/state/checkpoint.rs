//! Checkpoint persistence
//!
//! The manager owns the in-memory status map; a [`CheckpointStore`] decides
//! where the map is persisted. Failures here never stop a crawl.

use crate::state::crawler_state::{CheckpointFile, CrawlerState, CHECKPOINT_VERSION};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors reading or writing a checkpoint
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where checkpoints live
pub trait CheckpointStore: Send {
    /// Reads the stored checkpoint, `None` when there is none yet
    fn load(&self) -> Result<Option<CheckpointFile>, CheckpointError>;

    /// Replaces the stored checkpoint
    fn save(&mut self, file: &CheckpointFile) -> Result<(), CheckpointError>;
}

/// JSON file written atomically through a sibling temp file
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Result<Option<CheckpointFile>, CheckpointError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&mut self, file: &CheckpointFile) -> Result<(), CheckpointError> {
        let json = serde_json::to_string_pretty(file)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store; clones share the same slot and save history
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    slot: Arc<Mutex<Option<CheckpointFile>>>,
    history: Arc<Mutex<Vec<CheckpointFile>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with an existing checkpoint
    pub fn with_file(file: CheckpointFile) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(file))),
            history: Arc::default(),
        }
    }

    /// The last saved checkpoint
    pub fn snapshot(&self) -> Option<CheckpointFile> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Every checkpoint saved so far, oldest first
    pub fn history(&self) -> Vec<CheckpointFile> {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> Result<Option<CheckpointFile>, CheckpointError> {
        Ok(self.snapshot())
    }

    fn save(&mut self, file: &CheckpointFile) -> Result<(), CheckpointError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(file.clone());
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(file.clone());
        Ok(())
    }
}

/// Owns the status map of every source and persists it on each save
pub struct CheckpointManager {
    store: Box<dyn CheckpointStore>,
    states: BTreeMap<String, CrawlerState>,
}

impl CheckpointManager {
    pub fn new(store: Box<dyn CheckpointStore>) -> Self {
        Self {
            store,
            states: BTreeMap::new(),
        }
    }

    /// Loads the stored map, replacing the in-memory one
    ///
    /// Unreadable files and files from a newer version are logged and
    /// ignored.
    pub fn load(&mut self) {
        match self.store.load() {
            Ok(Some(file)) if file.version > CHECKPOINT_VERSION => {
                tracing::warn!(
                    "Ignoring checkpoint version {} (newest known is {})",
                    file.version,
                    CHECKPOINT_VERSION
                );
            }
            Ok(Some(file)) => {
                tracing::info!("Loaded checkpoint state for {} sources", file.sources.len());
                self.states = file.sources;
            }
            Ok(None) => tracing::debug!("No checkpoint found, starting fresh"),
            Err(e) => tracing::warn!("Could not load checkpoint: {}", e),
        }
    }

    /// Records the state of `source` and persists the whole map
    pub fn save(&mut self, source: &str, state: CrawlerState, now: DateTime<Utc>) {
        let state = CrawlerState {
            last_updated: Some(now),
            ..state
        };
        self.states.insert(source.to_string(), state);

        match self.store.save(&CheckpointFile::new(self.states.clone())) {
            Ok(()) => tracing::debug!("Checkpoint saved for {}", source),
            Err(e) => tracing::error!("Could not save checkpoint: {}", e),
        }
    }

    pub fn get(&self, source: &str) -> Option<&CrawlerState> {
        self.states.get(source)
    }

    pub fn states(&self) -> &BTreeMap<String, CrawlerState> {
        &self.states
    }
}
