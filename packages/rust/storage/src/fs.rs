//! Filesystem result store: one JSON file per record.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use webscout_shared::{Result, WebScoutError};

use crate::{RecordKind, ResultStore, valid_id};

/// Stores each record as `<root>/<kind>_<id>.json`.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| WebScoutError::io(&root, e))?;
        Ok(Self { root })
    }

    fn record_path(&self, kind: RecordKind, id: &str) -> PathBuf {
        self.root.join(format!("{}_{id}.json", kind.file_prefix()))
    }
}

#[async_trait]
impl ResultStore for FsStore {
    async fn save(&self, kind: RecordKind, id: &str, data: &serde_json::Value) -> bool {
        if !valid_id(id) {
            warn!(id, "rejecting save with invalid record id");
            return false;
        }

        let path = self.record_path(kind, id);
        let json = match serde_json::to_string_pretty(data) {
            Ok(json) => json,
            Err(e) => {
                warn!(id, error = %e, "failed to serialize record");
                return false;
            }
        };

        match std::fs::write(&path, json) {
            Ok(()) => {
                debug!(id, path = %path.display(), "record saved");
                true
            }
            Err(e) => {
                warn!(id, path = %path.display(), error = %e, "failed to save record");
                false
            }
        }
    }

    async fn get(&self, kind: RecordKind, id: &str) -> Option<serde_json::Value> {
        if !valid_id(id) {
            warn!(id, "rejecting get with invalid record id");
            return None;
        }

        let path = self.record_path(kind, id);
        if !path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(id, path = %path.display(), error = %e, "failed to read record");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(id, path = %path.display(), error = %e, "corrupt record file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (FsStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("ws-fs-test-{}", uuid::Uuid::now_v7()));
        (FsStore::open(&root).unwrap(), root)
    }

    #[tokio::test]
    async fn save_and_get_roundtrip() {
        let (store, root) = temp_store();
        let data = serde_json::json!({"query": "rust", "sources": []});

        assert!(store.save(RecordKind::Research, "r1", &data).await);
        assert_eq!(store.get(RecordKind::Research, "r1").await, Some(data));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn kinds_are_namespaced() {
        let (store, root) = temp_store();
        let research = serde_json::json!({"kind": "research"});
        let synthesis = serde_json::json!({"kind": "synthesis"});

        assert!(store.save(RecordKind::Research, "same-id", &research).await);
        assert!(store.save(RecordKind::Synthesis, "same-id", &synthesis).await);

        assert_eq!(
            store.get(RecordKind::Research, "same-id").await,
            Some(research)
        );
        assert_eq!(
            store.get(RecordKind::Synthesis, "same-id").await,
            Some(synthesis)
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn absent_record_is_none() {
        let (store, root) = temp_store();
        assert_eq!(store.get(RecordKind::Research, "missing").await, None);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn traversal_ids_are_rejected() {
        let (store, root) = temp_store();
        let data = serde_json::json!({});
        assert!(!store.save(RecordKind::Research, "../escape", &data).await);
        assert_eq!(store.get(RecordKind::Research, "../escape").await, None);
        let _ = std::fs::remove_dir_all(&root);
    }
}
