//! Snapshot store — last-known state per watched document, persisted as a
//! single JSON blob keyed by url.
//!
//! Loaded wholesale at run start, written wholesale at run end. Writes use
//! a `.tmp` + rename pattern so a reader never observes a partial map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last-known observed state of one target.
///
/// `content` is retained in full so the next change can be diffed against
/// it. Overwritten in place on change, never versioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub provider: String,
    pub title: String,
    pub fingerprint: String,
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

pub type SnapshotMap = HashMap<String, Snapshot>;

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a persisted blob exists. Sampled once per run, before
    /// `load`, to decide baseline mode.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the persisted map. Absent or corrupt state degrades to an
    /// empty map; corruption is logged and treated as no history.
    pub fn load(&self) -> SnapshotMap {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        path = %self.path.display(),
                        "corrupt snapshot store, starting fresh"
                    );
                    SnapshotMap::new()
                }
            },
            Err(_) => SnapshotMap::new(),
        }
    }

    /// Persist the full map atomically: write `<path>.tmp`, then rename
    /// into place. Creates the parent directory if absent.
    pub fn save(&self, map: &SnapshotMap) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(map).context("serializing snapshot store")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming {} into place", tmp.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(provider: &str) -> Snapshot {
        Snapshot {
            provider: provider.to_string(),
            title: format!("{provider} API Reference"),
            fingerprint: "deadbeef".to_string(),
            content: "line one\nline two".to_string(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn missing_file_is_empty_and_not_existing() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("data/snapshots.json"));
        assert!(!store.exists());
        assert!(store.load().is_empty());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("data/snapshots.json"));

        let mut map = SnapshotMap::new();
        map.insert("https://docs.example.test/api".to_string(), sample("Example"));
        store.save(&map).unwrap();

        assert!(store.exists());
        assert_eq!(store.load(), map);
    }

    #[test]
    fn corrupt_blob_degrades_to_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snapshots.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = SnapshotStore::new(&path);
        // The blob exists (not a baseline run) but its content is unusable.
        assert!(store.exists());
        assert!(store.load().is_empty());
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let store = SnapshotStore::new(tmp.path().join("snapshots.json"));
        store.save(&SnapshotMap::new()).unwrap();
        assert!(!tmp.path().join("snapshots.json.tmp").exists());
    }
}
