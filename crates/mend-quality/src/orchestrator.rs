//! Quality check orchestration
//!
//! Runs every registered formatter's check-only mode per file and
//! aggregates the results into a [`QualityReport`]. Fully sequential; a
//! failure on one file attaches its message to that file's check entry and
//! does not abort the rest.

use mend_core::{CheckResult, QualityReport, Result};
use mend_format::Formatter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directories never scanned for project sources
const SKIP_DIRS: &[&str] = &[
    ".git",
    ".mend",
    ".venv",
    "venv",
    "__pycache__",
    "node_modules",
];

/// Summary of a write-mode formatting pass
#[derive(Debug, Clone, Default)]
pub struct FormatSummary {
    /// Distinct files modified by any tool
    pub files_formatted: usize,
    /// Binary names of the tools that ran
    pub tools_executed: Vec<String>,
    /// Error strings collected across tools
    pub errors: Vec<String>,
}

/// Sequential quality orchestrator over a set of formatter adapters
pub struct QualityOrchestrator {
    formatters: Vec<Box<dyn Formatter>>,
    project_root: PathBuf,
    include_patterns: Vec<String>,
}

impl QualityOrchestrator {
    pub fn new(
        formatters: Vec<Box<dyn Formatter>>,
        project_root: impl Into<PathBuf>,
        include_patterns: Vec<String>,
    ) -> Self {
        Self {
            formatters,
            project_root: project_root.into(),
            include_patterns,
        }
    }

    /// Run each formatter's check-only mode per file
    pub async fn check_files(&self, paths: &[PathBuf]) -> Result<QualityReport> {
        let mut checks = Vec::new();
        let mut flagged: Vec<&PathBuf> = Vec::new();

        for path in paths {
            for formatter in &self.formatters {
                let check = match formatter.check_only(std::slice::from_ref(path)).await {
                    Ok(outcome) => {
                        let needs_formatting = !outcome.files.is_empty();
                        let error = if outcome.errors.is_empty() {
                            None
                        } else {
                            Some(outcome.errors.join("; "))
                        };
                        CheckResult {
                            tool: formatter.tool(),
                            file: path.clone(),
                            needs_formatting,
                            error,
                        }
                    }
                    Err(e) => {
                        // Best-effort: record the failure and keep going.
                        warn!("{} check failed for {}: {}", formatter.tool(), path.display(), e);
                        CheckResult {
                            tool: formatter.tool(),
                            file: path.clone(),
                            needs_formatting: false,
                            error: Some(e.to_string()),
                        }
                    }
                };

                if check.needs_formatting && !flagged.contains(&path) {
                    flagged.push(path);
                }
                checks.push(check);
            }
        }

        let report = QualityReport {
            issues_found: flagged.len(),
            files_checked: paths.len(),
            checks,
        };

        info!(
            "Quality check: {} issue(s) across {} file(s)",
            report.issues_found, report.files_checked
        );
        Ok(report)
    }

    /// Check every project source matching the include patterns
    pub async fn check_project(&self) -> Result<QualityReport> {
        let files = self.collect_project_files()?;
        debug!("Project scan found {} source file(s)", files.len());
        self.check_files(&files).await
    }

    /// Apply each formatter's write mode to the given files
    pub async fn format_files(&self, paths: &[PathBuf]) -> Result<FormatSummary> {
        let mut summary = FormatSummary::default();
        let mut modified: Vec<PathBuf> = Vec::new();

        for formatter in &self.formatters {
            summary.tools_executed.push(formatter.tool().binary().to_string());

            match formatter.format_files(paths).await {
                Ok(outcome) => {
                    for file in outcome.files {
                        if !modified.contains(&file) {
                            modified.push(file);
                        }
                    }
                    summary.errors.extend(outcome.errors);
                }
                Err(e) => {
                    warn!("{} format failed: {}", formatter.tool(), e);
                    summary.errors.push(e.to_string());
                }
            }
        }

        summary.files_formatted = modified.len();
        info!("Formatted {} file(s)", summary.files_formatted);
        Ok(summary)
    }

    fn collect_project_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for pattern in &self.include_patterns {
            let absolute = self.project_root.join(pattern);
            let pattern_str = absolute.to_string_lossy().to_string();

            let entries = glob::glob(&pattern_str).map_err(|e| {
                mend_core::MendError::Quality(format!("Bad include pattern {}: {}", pattern, e))
            })?;

            for entry in entries.flatten() {
                if entry.is_file() && !is_skipped(&entry) && !files.contains(&entry) {
                    files.push(entry);
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

fn is_skipped(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| SKIP_DIRS.contains(&s))
            .unwrap_or(false)
    })
}
