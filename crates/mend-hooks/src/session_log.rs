//! Session log - JSON-lines record of hook activity under `.mend/logs/`
//!
//! One timestamped record per hook invocation and per remediation outcome.
//! Every write is fail-open: a logging failure is a warning, never an
//! error a hook would surface.

use chrono::Utc;
use mend_core::fail_open::fail_open;
use mend_core::{MendError, RemediationResult, Result};
use serde_json::{json, Value};
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only JSON-lines session log
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    /// Create a logger writing to the given file
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Record one hook invocation
    ///
    /// This operation is fail-open - logging failures won't crash the hook
    pub async fn log_hook(&self, event: &str, files_checked: usize, issues_found: usize) {
        fail_open("session_log::log_hook", || async {
            self.append(json!({
                "record": "hook",
                "event": event,
                "files_checked": files_checked,
                "issues_found": issues_found,
            }))
            .await
        })
        .await;
    }

    /// Record one remediation outcome
    ///
    /// This operation is fail-open - logging failures won't crash the hook
    pub async fn log_remediation(&self, result: &RemediationResult) {
        fail_open("session_log::log_remediation", || async {
            self.append(json!({
                "record": "remediation",
                "result": result,
            }))
            .await
        })
        .await;
    }

    /// Record the end-of-session summary
    ///
    /// This operation is fail-open - logging failures won't crash the hook
    pub async fn log_summary(
        &self,
        session_id: Option<&str>,
        files_checked: usize,
        issues_found: usize,
        files_cleaned: usize,
    ) {
        fail_open("session_log::log_summary", || async {
            self.append(json!({
                "record": "summary",
                "session_id": session_id,
                "files_checked": files_checked,
                "issues_found": issues_found,
                "files_cleaned": files_cleaned,
            }))
            .await
        })
        .await;
    }

    /// Append one record as a JSON line (internal, returns Result for fail_open)
    async fn append(&self, mut record: Value) -> Result<()> {
        if let Some(object) = record.as_object_mut() {
            object.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_string(&record).map_err(MendError::Serialization)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
