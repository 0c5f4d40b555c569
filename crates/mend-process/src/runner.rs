//! External command execution abstraction

use async_trait::async_trait;
use mend_core::{MendError, Result};
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Output from an external command
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    /// Set when the command was killed by the timeout
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Failed output carrying an error description in stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
            timed_out: false,
        }
    }
}

impl From<Output> for ProcessOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            timed_out: false,
        }
    }
}

/// Trait for executing external commands (allows mocking in tests)
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Execute a command with the given arguments
    ///
    /// A timeout is reported as a failed output with `timed_out = true`,
    /// never as an `Err`.
    async fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<ProcessOutput>;

    /// Working directory for executed commands
    fn working_dir(&self) -> &PathBuf;
}

/// Real subprocess runner
#[derive(Clone)]
pub struct ProcessRunner {
    working_dir: PathBuf,
}

impl ProcessRunner {
    /// Create a runner with the given working directory
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

#[async_trait]
impl ProcessExecutor for ProcessRunner {
    #[instrument(skip(self, args), fields(cwd = %self.working_dir.display()))]
    async fn run(&self, program: &str, args: &[&str], timeout: Duration) -> Result<ProcessOutput> {
        debug!("Executing {} {:?}", program, args);

        let future = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(timeout, future).await {
            Ok(result) => result.map_err(|e| {
                MendError::Process(format!("Failed to execute {}: {}", program, e))
            })?,
            Err(_) => {
                warn!(
                    "{} timed out after {}s",
                    program,
                    timeout.as_secs()
                );
                return Ok(ProcessOutput {
                    stdout: String::new(),
                    stderr: format!("{} timed out after {}s", program, timeout.as_secs()),
                    success: false,
                    timed_out: true,
                });
            }
        };

        let process_output = ProcessOutput::from(output);

        if !process_output.success {
            debug!("{} failed: {}", program, process_output.stderr);
        }

        Ok(process_output)
    }

    fn working_dir(&self) -> &PathBuf {
        &self.working_dir
    }
}

/// Mock executor for testing
#[derive(Clone)]
pub struct MockProcessExecutor {
    working_dir: PathBuf,
    responses: std::collections::HashMap<String, ProcessOutput>,
}

impl Default for MockProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessExecutor {
    pub fn new() -> Self {
        Self {
            working_dir: PathBuf::from("/mock/project"),
            responses: std::collections::HashMap::new(),
        }
    }

    /// Register a canned response for `"program arg1 arg2 ..."`
    pub fn with_response(mut self, command: &str, output: ProcessOutput) -> Self {
        self.responses.insert(command.to_string(), output);
        self
    }
}

#[async_trait]
impl ProcessExecutor for MockProcessExecutor {
    async fn run(&self, program: &str, args: &[&str], _timeout: Duration) -> Result<ProcessOutput> {
        let key = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };
        self.responses
            .get(&key)
            .cloned()
            .ok_or_else(|| MendError::Process(format!("No mock response for: {}", key)))
    }

    fn working_dir(&self) -> &PathBuf {
        &self.working_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_executor() {
        let executor = MockProcessExecutor::new().with_response(
            "black --check x.py",
            ProcessOutput {
                stdout: "would reformat x.py".to_string(),
                stderr: String::new(),
                success: false,
                timed_out: false,
            },
        );

        let output = executor
            .run("black", &["--check", "x.py"], Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!output.success);
        assert!(output.stdout.contains("would reformat"));
    }

    #[tokio::test]
    async fn test_real_runner_success() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = ProcessRunner::new(temp.path());

        let output = runner
            .run("true", &[], Duration::from_secs(5))
            .await
            .unwrap();
        assert!(output.success);
        assert!(!output.timed_out);
    }

    #[tokio::test]
    async fn test_real_runner_timeout() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = ProcessRunner::new(temp.path());

        let output = runner
            .run("sleep", &["5"], Duration::from_millis(50))
            .await
            .unwrap();
        assert!(!output.success);
        assert!(output.timed_out);
    }

    #[tokio::test]
    async fn test_missing_binary_is_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = ProcessRunner::new(temp.path());

        let result = runner
            .run("mend-no-such-binary", &[], Duration::from_secs(5))
            .await;
        assert!(result.is_err());
    }
}
