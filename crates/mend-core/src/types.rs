//! Shared data model for quality checks and remediation
//!
//! These records cross crate boundaries: the quality orchestrator produces
//! a [`QualityReport`], the remediation orchestrator consumes it and builds
//! a [`RemediationResult`], and the git protection layer hands back tagged
//! commit outcomes. All of them are plain serde records so they can be
//! written to the session log verbatim.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Formatter tools known to the quality pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Code formatter (line length, string normalization)
    Black,
    /// Import sorter
    Isort,
}

impl Tool {
    /// Name of the external binary
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Black => "black",
            Tool::Isort => "isort",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.binary())
    }
}

/// Result of one (file, tool) check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub tool: Tool,
    pub file: PathBuf,
    pub needs_formatting: bool,
    /// Error message if the check itself failed for this file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated result of running checkers over a set of files
///
/// Immutable once produced within a remediation cycle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityReport {
    /// Number of files where any tool reported a violation
    pub issues_found: usize,
    /// Number of files examined
    pub files_checked: usize,
    /// One entry per (file, tool) pair examined, in check order
    pub checks: Vec<CheckResult>,
}

impl QualityReport {
    /// Files flagged by at least one tool, deduplicated, in first-seen order
    pub fn files_needing_format(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for check in &self.checks {
            if check.needs_formatting && !files.contains(&check.file) {
                files.push(check.file.clone());
            }
        }
        files
    }

    /// Tools that flagged at least one file
    pub fn tools_with_issues(&self) -> Vec<Tool> {
        let mut tools = Vec::new();
        for check in &self.checks {
            if check.needs_formatting && !tools.contains(&check.tool) {
                tools.push(check.tool);
            }
        }
        tools
    }
}

/// Outcome of a commit-creating git operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub success: bool,
    /// Hash of the created (or checkpointed) commit; empty on failure
    pub commit_hash: String,
}

impl CommitOutcome {
    pub fn failed() -> Self {
        Self {
            success: false,
            commit_hash: String::new(),
        }
    }
}

/// Outcome of a rollback to a protection commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackOutcome {
    pub success: bool,
}

/// Outcome of an assistant query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantOutcome {
    pub success: bool,
    pub output: String,
}

/// One step taken during a remediation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Step identifier: "protect", "sdk", "format", "verify", "commit", "rollback"
    pub kind: String,
    pub success: bool,
    pub detail: String,
}

impl Operation {
    pub fn new(kind: impl Into<String>, success: bool, detail: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            success,
            detail: detail.into(),
        }
    }
}

/// Final result of one remediation cycle
///
/// Built incrementally while the cycle runs; finalized once returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemediationResult {
    pub issues_found: usize,
    pub issues_fixed: usize,
    /// Ordered record of the steps taken
    pub operations: Vec<Operation>,
    pub success: bool,
    /// Error message when the run failed outside normal verification flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Present only when the assistant path ran and succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_result: Option<AssistantOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_needing_format_dedupes() {
        let report = QualityReport {
            issues_found: 1,
            files_checked: 1,
            checks: vec![
                CheckResult {
                    tool: Tool::Black,
                    file: PathBuf::from("x.py"),
                    needs_formatting: true,
                    error: None,
                },
                CheckResult {
                    tool: Tool::Isort,
                    file: PathBuf::from("x.py"),
                    needs_formatting: true,
                    error: None,
                },
            ],
        };

        assert_eq!(report.files_needing_format(), vec![PathBuf::from("x.py")]);
        assert_eq!(report.tools_with_issues(), vec![Tool::Black, Tool::Isort]);
    }

    #[test]
    fn test_clean_report_has_no_targets() {
        let report = QualityReport::default();
        assert!(report.files_needing_format().is_empty());
        assert!(report.tools_with_issues().is_empty());
    }

    #[test]
    fn test_result_serializes_without_absent_optionals() {
        let result = RemediationResult {
            issues_found: 0,
            issues_fixed: 0,
            operations: vec![],
            success: true,
            error: None,
            sdk_result: None,
        };

        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("sdk_result"));
        assert!(!json.contains("error"));
    }
}
