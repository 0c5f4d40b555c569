//! Adapter for the black code formatter

use async_trait::async_trait;
use mend_core::{Result, Tool};
use mend_process::ProcessExecutor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::formatter::{FormatOutcome, Formatter};
use crate::parse;

const DEFAULT_LINE_LENGTH: usize = 88;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Wraps `black --line-length N [--check] [--include PATTERN]... <path>`
pub struct BlackFormatter {
    executor: Arc<dyn ProcessExecutor>,
    line_length: usize,
    include_patterns: Vec<String>,
    timeout: Duration,
}

impl BlackFormatter {
    pub fn new(executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            executor,
            line_length: DEFAULT_LINE_LENGTH,
            include_patterns: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_line_length(mut self, line_length: usize) -> Self {
        self.line_length = line_length;
        self
    }

    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, check: bool, paths: &[PathBuf]) -> Result<FormatOutcome> {
        let line_length = self.line_length.to_string();
        let mut args: Vec<&str> = vec!["--line-length", &line_length];
        if check {
            args.push("--check");
        }
        for pattern in &self.include_patterns {
            args.push("--include");
            args.push(pattern);
        }
        let path_args: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        args.extend(path_args.iter().map(String::as_str));

        let output = self.executor.run("black", &args, self.timeout).await?;

        // black reports per-file results on stderr; a non-zero exit in
        // check mode just means violations were found.
        let combined = format!("{}\n{}", output.stdout, output.stderr);
        let files = parse::changed_files(&combined);
        let mut errors = parse::error_lines(&output.stderr);
        if output.timed_out {
            errors.push(output.stderr.clone());
        }

        debug!(
            "black {} flagged {} file(s), {} error(s)",
            if check { "--check" } else { "(write)" },
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
impl Formatter for BlackFormatter {
    fn tool(&self) -> Tool {
        Tool::Black
    }

    async fn check_only(&self, paths: &[PathBuf]) -> Result<FormatOutcome> {
        self.run(true, paths).await
    }

    async fn format_files(&self, paths: &[PathBuf]) -> Result<FormatOutcome> {
        self.run(false, paths).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_process::{MockProcessExecutor, ProcessOutput};

    fn outcome(stdout: &str, stderr: &str, success: bool) -> ProcessOutput {
        ProcessOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            success,
            timed_out: false,
        }
    }

    #[tokio::test]
    async fn test_check_flags_violating_file() {
        let executor = MockProcessExecutor::new().with_response(
            "black --line-length 88 --check x.py",
            outcome("", "x.py would be reformatted\n", false),
        );

        let formatter = BlackFormatter::new(Arc::new(executor));
        let result = formatter.check_only(&[PathBuf::from("x.py")]).await.unwrap();

        assert!(result.success);
        assert_eq!(result.files, vec![PathBuf::from("x.py")]);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_check_clean_file_is_idempotent() {
        let executor = MockProcessExecutor::new().with_response(
            "black --line-length 88 --check x.py",
            outcome("", "All done!\n1 file left unchanged.\n", true),
        );

        let formatter = BlackFormatter::new(Arc::new(executor));
        let first = formatter.check_only(&[PathBuf::from("x.py")]).await.unwrap();
        let second = formatter.check_only(&[PathBuf::from("x.py")]).await.unwrap();

        assert!(first.files.is_empty());
        assert!(second.files.is_empty());
    }

    #[tokio::test]
    async fn test_write_mode_reports_reformatted() {
        let executor = MockProcessExecutor::new().with_response(
            "black --line-length 100 x.py",
            outcome("", "reformatted x.py\nAll done!\n", true),
        );

        let formatter = BlackFormatter::new(Arc::new(executor)).with_line_length(100);
        let result = formatter
            .format_files(&[PathBuf::from("x.py")])
            .await
            .unwrap();

        assert_eq!(result.files, vec![PathBuf::from("x.py")]);
    }

    #[tokio::test]
    async fn test_parse_error_is_captured() {
        let executor = MockProcessExecutor::new().with_response(
            "black --line-length 88 --check bad.py",
            outcome("", "error: cannot format bad.py: Cannot parse: 1:4\n", false),
        );

        let formatter = BlackFormatter::new(Arc::new(executor));
        let result = formatter
            .check_only(&[PathBuf::from("bad.py")])
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
    }
}
