//! Adapter for the isort import sorter

use async_trait::async_trait;
use mend_core::{Result, Tool};
use mend_process::ProcessExecutor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::formatter::{FormatOutcome, Formatter};
use crate::parse;

const DEFAULT_PROFILE: &str = "black";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Wraps `isort --profile NAME [--check-only --diff] <path>`
pub struct IsortFormatter {
    executor: Arc<dyn ProcessExecutor>,
    profile: String,
    timeout: Duration,
}

impl IsortFormatter {
    pub fn new(executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            executor,
            profile: DEFAULT_PROFILE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, check: bool, paths: &[PathBuf]) -> Result<FormatOutcome> {
        let mut args: Vec<&str> = vec!["--profile", &self.profile];
        if check {
            args.push("--check-only");
            args.push("--diff");
        }
        let path_args: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        args.extend(path_args.iter().map(String::as_str));

        let output = self.executor.run("isort", &args, self.timeout).await?;

        // Check mode reports violations as diff headers on stdout; write
        // mode prints "Fixing <path>" per modified file.
        let combined = format!("{}\n{}", output.stdout, output.stderr);
        let files = parse::changed_files(&combined);
        let mut errors = parse::error_lines(&output.stderr);
        if output.timed_out {
            errors.push(output.stderr.clone());
        }

        debug!(
            "isort {} flagged {} file(s), {} error(s)",
            if check { "--check-only" } else { "(write)" },
            files.len(),
            errors.len()
        );

        Ok(FormatOutcome {
            success: !output.timed_out && errors.is_empty(),
            files,
            errors,
        })
    }
}

#[async_trait]
impl Formatter for IsortFormatter {
    fn tool(&self) -> Tool {
        Tool::Isort
    }

    async fn check_only(&self, paths: &[PathBuf]) -> Result<FormatOutcome> {
        self.run(true, paths).await
    }

    async fn format_files(&self, paths: &[PathBuf]) -> Result<FormatOutcome> {
        self.run(false, paths).await
    }
}
