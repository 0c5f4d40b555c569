//! Formatter adapter seam

use async_trait::async_trait;
use mend_core::{Result, Tool};
use std::path::PathBuf;

/// Structured result of one formatter invocation
///
/// `success` reflects whether the tool ran cleanly, not whether files were
/// compliant: a check-only run that flags violations is still a success.
#[derive(Debug, Clone, Default)]
pub struct FormatOutcome {
    pub success: bool,
    /// Files the tool changed (write mode) or flagged (check mode)
    pub files: Vec<PathBuf>,
    /// Error strings captured from the tool's output
    pub errors: Vec<String>,
}

/// A formatter adapter: build the command line, run it, parse the text
#[async_trait]
pub trait Formatter: Send + Sync {
    /// Which tool this adapter wraps
    fn tool(&self) -> Tool;

    /// Run in check-only mode; flagged files are reported, nothing written
    async fn check_only(&self, paths: &[PathBuf]) -> Result<FormatOutcome>;

    /// Run in write mode; changed files are reported
    async fn format_files(&self, paths: &[PathBuf]) -> Result<FormatOutcome>;
}
