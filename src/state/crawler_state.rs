use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version written into new checkpoint files
pub const CHECKPOINT_VERSION: u32 = 1;

/// Progress of one source (a site name or "Wikipedia")
///
/// Missing fields default when read, so older files stay readable after
/// fields are added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerState {
    /// Last URL taken from the frontier, cleared on completion
    pub last_url: Option<String>,

    /// Articles stored in the run so far
    pub articles_found: u64,

    /// URLs dequeued and fetched in the run so far
    pub urls_visited: u64,

    /// Depth of the last dequeued URL
    pub depth: u32,

    /// Whether the run of this source finished
    pub completed: bool,

    /// Set by the checkpoint manager on every save
    pub last_updated: Option<DateTime<Utc>>,
}

/// On-disk checkpoint document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointFile {
    pub version: u32,
    #[serde(default)]
    pub sources: BTreeMap<String, CrawlerState>,
}

impl CheckpointFile {
    pub fn new(sources: BTreeMap<String, CrawlerState>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let file: CheckpointFile = serde_json::from_str(
            r#"{"version": 1, "sources": {"Vogue": {"articles_found": 40, "future_field": true}}}"#,
        )
        .unwrap();

        let vogue = &file.sources["Vogue"];
        assert_eq!(vogue.articles_found, 40);
        assert_eq!(vogue.urls_visited, 0);
        assert_eq!(vogue.last_url, None);
        assert!(!vogue.completed);
    }

    #[test]
    fn test_serialized_shape() {
        let mut sources = BTreeMap::new();
        sources.insert(
            "ELLE".to_string(),
            CrawlerState {
                articles_found: 3,
                completed: true,
                ..CrawlerState::default()
            },
        );

        let value = serde_json::to_value(CheckpointFile::new(sources)).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["sources"]["ELLE"]["articles_found"], 3);
        assert_eq!(value["sources"]["ELLE"]["completed"], true);
    }
}
