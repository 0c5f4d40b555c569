//! Protection commits: checkpoint, completion, rollback
//!
//! Before any automated remediation touches the tree, a protection commit
//! is created so a failed run can be rolled back atomically. A successful
//! run is recorded with a completion commit that supersedes the checkpoint.
//!
//! All operations degrade cleanly: when git is missing or the directory is
//! not a repository, they report a failed outcome instead of erroring, and
//! the caller decides whether that is fatal (remediation treats a failed
//! protection commit as an early abort).

use async_trait::async_trait;
use mend_core::{CommitOutcome, Result, RollbackOutcome};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::command::GitExecutor;

/// Version-control checkpoint interface consumed by the remediation cycle
#[async_trait]
pub trait GitProtection: Send + Sync {
    /// Create a checkpoint commit before risky automated edits
    ///
    /// `target_files = None` protects the whole codebase.
    async fn create_protection_commit(
        &self,
        description: &str,
        target_files: Option<&[PathBuf]>,
    ) -> Result<CommitOutcome>;

    /// Record a successful remediation
    async fn create_completion_commit(
        &self,
        description: &str,
        tools_executed: &[String],
        files_modified: usize,
    ) -> Result<CommitOutcome>;

    /// Restore the tree to a previously created protection commit
    ///
    /// Idempotent: rolling back twice to the same hash is a no-op the
    /// second time.
    async fn rollback_to_protection_commit(&self, commit_hash: &str) -> Result<RollbackOutcome>;
}

/// Git-backed protection manager
pub struct ProtectionManager<E: GitExecutor> {
    executor: E,
}

impl<E: GitExecutor> ProtectionManager<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Stage the protection scope: everything, or exactly the listed files
    async fn stage(&self, target_files: Option<&[PathBuf]>) -> Result<bool> {
        let output = match target_files {
            None => self.executor.exec(&["add", "-A"]).await?,
            Some(files) => {
                let file_args: Vec<String> = files
                    .iter()
                    .map(|p| p.to_string_lossy().to_string())
                    .collect();
                let mut args: Vec<&str> = vec!["add", "--"];
                args.extend(file_args.iter().map(String::as_str));
                self.executor.exec(&args).await?
            }
        };
        Ok(output.success)
    }

    /// Commit staged changes; a clean tree is not a failure
    ///
    /// Returns the checkpoint hash: the new commit, or current HEAD when
    /// there was nothing to commit.
    async fn commit_or_head(&self, message: &str) -> Result<CommitOutcome> {
        let commit = self.executor.exec(&["commit", "-m", message]).await?;

        if !commit.success {
            let combined = format!("{}{}", commit.stdout, commit.stderr);
            if !combined.contains("nothing to commit") {
                warn!("Commit failed: {}", commit.stderr.trim());
                return Ok(CommitOutcome::failed());
            }
        }

        let head = self.executor.exec(&["rev-parse", "HEAD"]).await?;
        if !head.success {
            warn!("rev-parse HEAD failed: {}", head.stderr.trim());
            return Ok(CommitOutcome::failed());
        }

        Ok(CommitOutcome {
            success: true,
            commit_hash: head.stdout.trim().to_string(),
        })
    }
}

#[async_trait]
impl<E: GitExecutor> GitProtection for ProtectionManager<E> {
    async fn create_protection_commit(
        &self,
        description: &str,
        target_files: Option<&[PathBuf]>,
    ) -> Result<CommitOutcome> {
        let staged = match self.stage(target_files).await {
            Ok(staged) => staged,
            Err(e) => {
                warn!("Protection staging unavailable: {}", e);
                return Ok(CommitOutcome::failed());
            }
        };
        if !staged {
            warn!("Protection staging failed");
            return Ok(CommitOutcome::failed());
        }

        let message = format!("mend: protection checkpoint - {}", description);
        let outcome = match self.commit_or_head(&message).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Protection commit unavailable: {}", e);
                return Ok(CommitOutcome::failed());
            }
        };

        if outcome.success {
            info!("Created protection commit {}", outcome.commit_hash);
        }
        Ok(outcome)
    }

    async fn create_completion_commit(
        &self,
        description: &str,
        tools_executed: &[String],
        files_modified: usize,
    ) -> Result<CommitOutcome> {
        let staged = match self.stage(None).await {
            Ok(staged) => staged,
            Err(e) => {
                warn!("Completion staging unavailable: {}", e);
                return Ok(CommitOutcome::failed());
            }
        };
        if !staged {
            warn!("Completion staging failed");
            return Ok(CommitOutcome::failed());
        }

        let message = format!(
            "mend: remediation complete - {} [tools: {}] ({} files)",
            description,
            tools_executed.join(", "),
            files_modified
        );
        let outcome = match self.commit_or_head(&message).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Completion commit unavailable: {}", e);
                return Ok(CommitOutcome::failed());
            }
        };

        if outcome.success {
            info!("Created completion commit {}", outcome.commit_hash);
        }
        Ok(outcome)
    }

    async fn rollback_to_protection_commit(&self, commit_hash: &str) -> Result<RollbackOutcome> {
        info!("Rolling back to protection commit {}", commit_hash);

        let output = match self.executor.exec(&["reset", "--hard", commit_hash]).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Rollback unavailable: {}", e);
                return Ok(RollbackOutcome { success: false });
            }
        };

        if !output.success {
            warn!("Rollback failed: {}", output.stderr.trim());
        }
        Ok(RollbackOutcome {
            success: output.success,
        })
    }
}

/// Recorded call made against a [`MockProtection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionCall {
    Protect { description: String, whole_tree: bool },
    Complete { tools: Vec<String>, files: usize },
    Rollback { commit_hash: String },
}

/// In-memory protection mock for orchestrator tests
#[derive(Clone)]
pub struct MockProtection {
    protect_outcome: CommitOutcome,
    complete_outcome: CommitOutcome,
    rollback_outcome: RollbackOutcome,
    calls: Arc<Mutex<Vec<ProtectionCall>>>,
}

impl Default for MockProtection {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProtection {
    pub fn new() -> Self {
        Self {
            protect_outcome: CommitOutcome {
                success: true,
                commit_hash: "protect-hash".to_string(),
            },
            complete_outcome: CommitOutcome {
                success: true,
                commit_hash: "complete-hash".to_string(),
            },
            rollback_outcome: RollbackOutcome { success: true },
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_protect_outcome(mut self, outcome: CommitOutcome) -> Self {
        self.protect_outcome = outcome;
        self
    }

    pub fn with_complete_outcome(mut self, outcome: CommitOutcome) -> Self {
        self.complete_outcome = outcome;
        self
    }

    pub fn with_rollback_outcome(mut self, outcome: RollbackOutcome) -> Self {
        self.rollback_outcome = outcome;
        self
    }

    /// Calls recorded so far, in order
    pub fn calls(&self) -> Vec<ProtectionCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitProtection for MockProtection {
    async fn create_protection_commit(
        &self,
        description: &str,
        target_files: Option<&[PathBuf]>,
    ) -> Result<CommitOutcome> {
        self.calls.lock().unwrap().push(ProtectionCall::Protect {
            description: description.to_string(),
            whole_tree: target_files.is_none(),
        });
        Ok(self.protect_outcome.clone())
    }

    async fn create_completion_commit(
        &self,
        _description: &str,
        tools_executed: &[String],
        files_modified: usize,
    ) -> Result<CommitOutcome> {
        self.calls.lock().unwrap().push(ProtectionCall::Complete {
            tools: tools_executed.to_vec(),
            files: files_modified,
        });
        Ok(self.complete_outcome.clone())
    }

    async fn rollback_to_protection_commit(&self, commit_hash: &str) -> Result<RollbackOutcome> {
        self.calls.lock().unwrap().push(ProtectionCall::Rollback {
            commit_hash: commit_hash.to_string(),
        });
        Ok(self.rollback_outcome.clone())
    }
}
