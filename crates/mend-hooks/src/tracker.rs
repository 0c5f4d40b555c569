//! Session tracker - files touched in the last 24 hours
//!
//! A small JSON file under `.mend/tools/` mapping absolute paths to the
//! time they were last touched. Entries older than the retention window
//! are pruned on load. The auxiliary watcher and the Stop hook consume
//! this to know which files the session actually changed.

use chrono::{DateTime, Duration, Utc};
use mend_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const RETENTION_HOURS: i64 = 24;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackerState {
    files: HashMap<PathBuf, DateTime<Utc>>,
}

/// Tracks recently touched files across hook invocations
pub struct SessionTracker {
    path: PathBuf,
}

impl SessionTracker {
    /// Create a tracker backed by the given file
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Record a touched file at the current time
    pub async fn record(&self, file: &Path) -> Result<()> {
        let mut state = self.load().await;
        state.files.insert(file.to_path_buf(), Utc::now());
        self.save(&state).await
    }

    /// Files touched within the retention window, sorted
    pub async fn recent_files(&self) -> Vec<PathBuf> {
        let state = self.load().await;
        let mut files: Vec<PathBuf> = state.files.into_keys().collect();
        files.sort();
        files
    }

    /// Load and prune; a missing or corrupt file is an empty state
    async fn load(&self) -> TrackerState {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => return TrackerState::default(),
        };

        let mut state: TrackerState = match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                debug!("Discarding corrupt tracker file: {}", e);
                return TrackerState::default();
            }
        };

        let cutoff = Utc::now() - Duration::hours(RETENTION_HOURS);
        state.files.retain(|_, touched| *touched >= cutoff);
        state
    }

    async fn save(&self, state: &TrackerState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_and_recall() {
        let temp = TempDir::new().unwrap();
        let tracker = SessionTracker::new(temp.path().join("tools").join("session_tracker.json"));

        tracker.record(Path::new("/p/b.py")).await.unwrap();
        tracker.record(Path::new("/p/a.py")).await.unwrap();
        tracker.record(Path::new("/p/a.py")).await.unwrap();

        let files = tracker.recent_files().await;
        assert_eq!(files, vec![PathBuf::from("/p/a.py"), PathBuf::from("/p/b.py")]);
    }

    #[tokio::test]
    async fn test_stale_entries_pruned_on_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session_tracker.json");

        let stale = Utc::now() - Duration::hours(48);
        let content = serde_json::json!({
            "files": {
                "/p/old.py": stale.to_rfc3339(),
                "/p/new.py": Utc::now().to_rfc3339(),
            }
        });
        tokio::fs::write(&path, content.to_string()).await.unwrap();

        let tracker = SessionTracker::new(path);
        let files = tracker.recent_files().await;
        assert_eq!(files, vec![PathBuf::from("/p/new.py")]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty_state() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session_tracker.json");
        tokio::fs::write(&path, "{garbage").await.unwrap();

        let tracker = SessionTracker::new(path.clone());
        assert!(tracker.recent_files().await.is_empty());

        // Recording over a corrupt file resets it cleanly.
        tracker.record(Path::new("/p/x.py")).await.unwrap();
        assert_eq!(tracker.recent_files().await.len(), 1);
    }
}
