//! Git access for the protection layer
//!
//! Everything here shells out to the `git` binary through the shared
//! subprocess runner; no git library is linked. The [`GitExecutor`] trait
//! is the seam the protection manager tests against: a non-zero exit comes
//! back as an unsuccessful [`GitOutput`], while `Err` is reserved for git
//! being missing or unspawnable. That split matters because the protection
//! manager treats "commit rejected" and "no git at all" differently.

use async_trait::async_trait;
use mend_core::{MendError, Result};
use mend_process::{ProcessExecutor, ProcessOutput, ProcessRunner};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Staging, committing, and resetting are local metadata operations; a git
/// call held past this is stuck, not slow.
const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of one git invocation
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl GitOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
        }
    }

    pub fn err(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
        }
    }
}

impl From<ProcessOutput> for GitOutput {
    // A timed-out git call folds into plain failure; the runner already
    // put the timeout message in stderr.
    fn from(output: ProcessOutput) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.success,
        }
    }
}

/// Seam between the protection manager and an actual repository
#[async_trait]
pub trait GitExecutor: Send + Sync {
    /// Run one git command, given its arguments without the leading `git`
    async fn exec(&self, args: &[&str]) -> Result<GitOutput>;

    /// Toplevel of the work tree commands run in
    fn repo_root(&self) -> &PathBuf;
}

/// Runs git against a single repository
#[derive(Clone)]
pub struct GitCommand {
    runner: Arc<dyn ProcessExecutor>,
    repo_root: PathBuf,
}

impl GitCommand {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        let repo_root = repo_root.into();
        Self {
            runner: Arc::new(ProcessRunner::new(&repo_root)),
            repo_root,
        }
    }

    /// Resolve the work tree enclosing the current directory
    ///
    /// Fails outside a work tree; callers fall back to treating the
    /// current directory as the project root.
    pub async fn detect() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let probe = ProcessRunner::new(&cwd);
        let output = probe
            .run("git", &["rev-parse", "--show-toplevel"], GIT_TIMEOUT)
            .await
            .map_err(|e| MendError::GitCommand(format!("git is not runnable: {}", e)))?;

        if !output.success {
            return Err(MendError::GitCommand(format!(
                "{} is not inside a git work tree",
                cwd.display()
            )));
        }
        Ok(Self::new(output.stdout.trim()))
    }
}

#[async_trait]
impl GitExecutor for GitCommand {
    async fn exec(&self, args: &[&str]) -> Result<GitOutput> {
        let output = self
            .runner
            .run("git", args, GIT_TIMEOUT)
            .await
            .map_err(|e| MendError::GitCommand(e.to_string()))?;
        Ok(GitOutput::from(output))
    }

    fn repo_root(&self) -> &PathBuf {
        &self.repo_root
    }
}

/// Scripted repository for protection manager tests
///
/// Replies are keyed by the joined argument list and every command is
/// recorded in order. An unscripted command is an `Err`, which doubles as
/// the "git unavailable" fixture.
#[derive(Clone)]
pub struct MockGitExecutor {
    repo_root: PathBuf,
    responses: HashMap<String, GitOutput>,
    commands: Arc<Mutex<Vec<String>>>,
}

impl Default for MockGitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitExecutor {
    pub fn new() -> Self {
        Self {
            repo_root: PathBuf::from("/mock/repo"),
            responses: HashMap::new(),
            commands: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(mut self, command: &str, output: GitOutput) -> Self {
        self.responses.insert(command.to_string(), output);
        self
    }

    /// Joined argument lists of every command run, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitExecutor for MockGitExecutor {
    async fn exec(&self, args: &[&str]) -> Result<GitOutput> {
        let key = args.join(" ");
        self.commands.lock().unwrap().push(key.clone());
        self.responses
            .get(&key)
            .cloned()
            .ok_or_else(|| MendError::GitCommand(format!("unscripted git command: {}", key)))
    }

    fn repo_root(&self) -> &PathBuf {
        &self.repo_root
    }
}
