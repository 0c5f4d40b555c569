//! Well-known directory resolution
//!
//! Everything mend persists lives under `.mend/` in the installation root:
//! logs, tool state, and pre-remediation backups.

use std::path::{Path, PathBuf};

use crate::Result;

/// Resolves well-known directories relative to an installation root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at the given project directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root this resolver was created with
    pub fn project_root(&self) -> &Path {
        &self.root
    }

    /// `.mend/` state directory
    pub fn mend_dir(&self) -> PathBuf {
        self.root.join(".mend")
    }

    /// Log directory
    pub fn logs_dir(&self) -> PathBuf {
        self.mend_dir().join("logs")
    }

    /// Tool state directory
    pub fn tools_dir(&self) -> PathBuf {
        self.mend_dir().join("tools")
    }

    /// Pre-remediation backup directory
    pub fn backups_dir(&self) -> PathBuf {
        self.mend_dir().join("backups")
    }

    /// JSON-lines session log
    pub fn session_log_path(&self) -> PathBuf {
        self.logs_dir().join("session.jsonl")
    }

    /// Session tracker file (files touched in the last 24h)
    pub fn tracker_path(&self) -> PathBuf {
        self.tools_dir().join("session_tracker.json")
    }

    /// Repository-level configuration file
    pub fn config_path(&self) -> PathBuf {
        self.mend_dir().join("config.toml")
    }

    /// Create the `.mend/` directory layout if missing
    pub fn ensure_layout(&self) -> Result<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        std::fs::create_dir_all(self.tools_dir())?;
        std::fs::create_dir_all(self.backups_dir())?;
        Ok(())
    }
}
