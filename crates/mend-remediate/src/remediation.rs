//! Git-protected remediation cycle
//!
//! The full cycle is protect, remediate, verify, then commit or roll back.
//! The protection commit is the only hard prerequisite: if it cannot be
//! created the cycle aborts before touching any file. Everything after it
//! runs under the checkpoint, so any failure ends in a rollback to the
//! exact protection hash.
//!
//! `remediate` itself never returns `Err`. Every failure mode is folded
//! into the returned [`RemediationResult`] so hook callers can log it and
//! exit zero.

use mend_core::{Operation, QualityReport, RemediationResult, Result};
use mend_git::GitProtection;
use mend_quality::{QualityOrchestrator, Verifier};
use std::sync::Arc;
use tracing::{info, warn};

use crate::assistant::Assistant;
use crate::prompt::build_remediation_prompt;

/// Drives one protected remediation cycle end to end
pub struct RemediationOrchestrator {
    protection: Arc<dyn GitProtection>,
    quality: QualityOrchestrator,
    verifier: Verifier,
    assistant: Option<Arc<dyn Assistant>>,
}

impl RemediationOrchestrator {
    pub fn new(
        protection: Arc<dyn GitProtection>,
        quality: QualityOrchestrator,
        verifier: Verifier,
    ) -> Self {
        Self {
            protection,
            quality,
            verifier,
            assistant: None,
        }
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn Assistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    /// Run one remediation cycle for the issues in `report`
    ///
    /// `use_sdk` requests assistant-guided remediation first; when the
    /// assistant is unavailable or fails, the tool path runs as if
    /// `use_sdk` had been false.
    pub async fn remediate(&self, report: &QualityReport, use_sdk: bool) -> RemediationResult {
        let mut result = RemediationResult {
            issues_found: report.issues_found,
            issues_fixed: 0,
            operations: Vec::new(),
            success: false,
            error: None,
            sdk_result: None,
        };

        if report.issues_found == 0 {
            info!("No issues to remediate");
            result.success = true;
            return result;
        }

        let description = format!("{} formatting issue(s)", report.issues_found);
        let protection = match self
            .protection
            .create_protection_commit(&description, None)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Protection commit errored: {}", e);
                result
                    .operations
                    .push(Operation::new("protect", false, e.to_string()));
                result.error = Some(format!("Protection commit failed: {}", e));
                return result;
            }
        };

        if !protection.success {
            warn!("Protection commit failed, aborting remediation");
            result.operations.push(Operation::new(
                "protect",
                false,
                "protection commit unavailable".to_string(),
            ));
            result.error = Some("Could not create protection commit".to_string());
            return result;
        }

        let protection_hash = protection.commit_hash.clone();
        result.operations.push(Operation::new(
            "protect",
            true,
            protection_hash.clone(),
        ));

        if let Err(e) = self
            .run_protected(report, use_sdk, &mut result, &protection_hash)
            .await
        {
            warn!("Remediation errored under protection, rolling back: {}", e);
            result.error = Some(e.to_string());
            result.success = false;
            self.rollback(&mut result, &protection_hash).await;
        }

        result
    }

    /// Everything between the protection commit and the resolution
    ///
    /// Any `Err` out of here is caught by `remediate`, which rolls back to
    /// the checkpoint.
    async fn run_protected(
        &self,
        report: &QualityReport,
        use_sdk: bool,
        result: &mut RemediationResult,
        protection_hash: &str,
    ) -> Result<()> {
        let targets = report.files_needing_format();
        let mut tools_executed: Vec<String> = Vec::new();
        let mut fixed_by_sdk = false;

        if use_sdk {
            fixed_by_sdk = self.try_assistant(report, result).await;
            if fixed_by_sdk {
                tools_executed.push("assistant".to_string());
            }
        }

        if !fixed_by_sdk {
            let summary = self.quality.format_files(&targets).await?;
            result.issues_fixed = summary.files_formatted;
            tools_executed = summary.tools_executed;

            let detail = if summary.errors.is_empty() {
                format!("{} file(s) formatted", summary.files_formatted)
            } else {
                summary.errors.join("; ")
            };
            result.operations.push(Operation::new(
                "format",
                summary.errors.is_empty(),
                detail,
            ));
        }

        let verification = self.verifier.verify(&targets).await?;
        result.operations.push(Operation::new(
            "verify",
            verification.success,
            format!(
                "compiled={} tests_discovered={}",
                verification.compiled, verification.tests_discovered
            ),
        ));

        if !verification.success {
            warn!("Verification failed, rolling back remediation");
            result.issues_fixed = 0;
            result.error = Some("Verification failed after remediation".to_string());
            self.rollback(result, protection_hash).await;
            return Ok(());
        }

        let description = format!("{} formatting issue(s)", report.issues_found);
        let completion = self
            .protection
            .create_completion_commit(&description, &tools_executed, result.issues_fixed)
            .await?;

        if completion.success {
            result
                .operations
                .push(Operation::new("commit", true, completion.commit_hash));
            result.success = true;
            info!(
                "Remediation complete: {} issue(s) fixed",
                result.issues_fixed
            );
        } else {
            // A completion commit that cannot land leaves the tree in an
            // unrecorded state, which violates the checkpoint contract.
            warn!("Completion commit failed, rolling back remediation");
            result.operations.push(Operation::new(
                "commit",
                false,
                "completion commit unavailable".to_string(),
            ));
            result.issues_fixed = 0;
            result.error = Some("Completion commit failed".to_string());
            self.rollback(result, protection_hash).await;
        }

        Ok(())
    }

    /// Assistant-guided path; returns true only when the assistant claims
    /// success
    async fn try_assistant(&self, report: &QualityReport, result: &mut RemediationResult) -> bool {
        let Some(assistant) = &self.assistant else {
            result.operations.push(Operation::new(
                "sdk",
                false,
                "no assistant configured".to_string(),
            ));
            return false;
        };

        let prompt = build_remediation_prompt(report);
        match assistant.query(&prompt).await {
            Ok(outcome) if outcome.success => {
                result.issues_fixed = report.issues_found;
                result.operations.push(Operation::new(
                    "sdk",
                    true,
                    format!("{} char response", outcome.output.len()),
                ));
                result.sdk_result = Some(outcome);
                true
            }
            Ok(_) => {
                warn!("Assistant declined remediation, falling back to tools");
                result.operations.push(Operation::new(
                    "sdk",
                    false,
                    "assistant reported failure".to_string(),
                ));
                false
            }
            Err(e) => {
                warn!("Assistant unavailable, falling back to tools: {}", e);
                result
                    .operations
                    .push(Operation::new("sdk", false, e.to_string()));
                false
            }
        }
    }

    /// Best-effort rollback to the checkpoint; records the outcome
    async fn rollback(&self, result: &mut RemediationResult, protection_hash: &str) {
        match self
            .protection
            .rollback_to_protection_commit(protection_hash)
            .await
        {
            Ok(outcome) => {
                result.operations.push(Operation::new(
                    "rollback",
                    outcome.success,
                    protection_hash.to_string(),
                ));
                if !outcome.success {
                    warn!("Rollback to {} failed", protection_hash);
                }
            }
            Err(e) => {
                warn!("Rollback errored: {}", e);
                result
                    .operations
                    .push(Operation::new("rollback", false, e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::MockAssistant;
    use async_trait::async_trait;
    use mend_core::{CheckResult, CommitOutcome, MendError, RollbackOutcome, Tool};
    use mend_format::{FormatOutcome, Formatter};
    use mend_git::{MockProtection, ProtectionCall};
    use mend_process::{MockProcessExecutor, ProcessOutput};
    use std::collections::HashSet;
    use std::path::PathBuf;

    struct FakeFormatter {
        tool: Tool,
        flags: HashSet<PathBuf>,
    }

    impl FakeFormatter {
        fn new(tool: Tool, flags: &[&str]) -> Self {
            Self {
                tool,
                flags: flags.iter().map(PathBuf::from).collect(),
            }
        }
    }

    #[async_trait]
    impl Formatter for FakeFormatter {
        fn tool(&self) -> Tool {
            self.tool
        }

        async fn check_only(&self, paths: &[PathBuf]) -> Result<FormatOutcome> {
            Ok(FormatOutcome {
                success: true,
                files: paths
                    .iter()
                    .filter(|p| self.flags.contains(*p))
                    .cloned()
                    .collect(),
                errors: Vec::new(),
            })
        }

        async fn format_files(&self, paths: &[PathBuf]) -> Result<FormatOutcome> {
            self.check_only(paths).await
        }
    }

    fn report_with_issues(files: &[&str]) -> QualityReport {
        let checks: Vec<CheckResult> = files
            .iter()
            .map(|f| CheckResult {
                tool: Tool::Black,
                file: PathBuf::from(f),
                needs_formatting: true,
                error: None,
            })
            .collect();
        QualityReport {
            issues_found: files.len(),
            files_checked: files.len(),
            checks,
        }
    }

    fn quality(flags: &[&str]) -> QualityOrchestrator {
        QualityOrchestrator::new(
            vec![
                Box::new(FakeFormatter::new(Tool::Black, flags)),
                Box::new(FakeFormatter::new(Tool::Isort, &[])),
            ],
            "/project",
            vec!["**/*.py".to_string()],
        )
    }

    fn passing_verifier(files: &[&str]) -> Verifier {
        let compile_key = format!("python -m py_compile {}", files.join(" "));
        let executor = MockProcessExecutor::new()
            .with_response(&compile_key, ProcessOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
                timed_out: false,
            })
            .with_response("pytest --collect-only -q", ProcessOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
                timed_out: false,
            });
        Verifier::new(Arc::new(executor))
    }

    fn failing_verifier(files: &[&str]) -> Verifier {
        let compile_key = format!("python -m py_compile {}", files.join(" "));
        let executor = MockProcessExecutor::new().with_response(&compile_key, ProcessOutput {
            stdout: String::new(),
            stderr: "SyntaxError".to_string(),
            success: false,
            timed_out: false,
        });
        Verifier::new(Arc::new(executor))
    }

    fn op_kinds(result: &RemediationResult) -> Vec<&str> {
        result.operations.iter().map(|o| o.kind.as_str()).collect()
    }

    #[tokio::test]
    async fn test_zero_issues_skips_git_entirely() {
        let protection = MockProtection::new();
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection.clone()),
            quality(&[]),
            passing_verifier(&[]),
        );

        let report = QualityReport {
            issues_found: 0,
            files_checked: 3,
            checks: Vec::new(),
        };
        let result = orchestrator.remediate(&report, false).await;

        assert!(result.success);
        assert!(result.operations.is_empty());
        assert!(protection.calls().is_empty());
    }

    #[tokio::test]
    async fn test_successful_cycle_ends_in_exactly_one_completion_commit() {
        let protection = MockProtection::new();
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection.clone()),
            quality(&["a.py", "b.py"]),
            passing_verifier(&["a.py", "b.py"]),
        );

        let result = orchestrator
            .remediate(&report_with_issues(&["a.py", "b.py"]), false)
            .await;

        assert!(result.success);
        assert_eq!(result.issues_fixed, 2);
        assert_eq!(op_kinds(&result), vec!["protect", "format", "verify", "commit"]);

        let calls = protection.calls();
        let completions = calls
            .iter()
            .filter(|c| matches!(c, ProtectionCall::Complete { .. }))
            .count();
        let rollbacks = calls
            .iter()
            .filter(|c| matches!(c, ProtectionCall::Rollback { .. }))
            .count();
        assert_eq!(completions, 1);
        assert_eq!(rollbacks, 0);
    }

    #[tokio::test]
    async fn test_distinct_tools_flagging_distinct_files() {
        let protection = MockProtection::new();
        let quality = QualityOrchestrator::new(
            vec![
                Box::new(FakeFormatter::new(Tool::Black, &["x.py"])),
                Box::new(FakeFormatter::new(Tool::Isort, &["y.py"])),
            ],
            "/project",
            vec!["**/*.py".to_string()],
        );
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection.clone()),
            quality,
            passing_verifier(&["x.py", "y.py"]),
        );

        let report = QualityReport {
            issues_found: 2,
            files_checked: 2,
            checks: vec![
                CheckResult {
                    tool: Tool::Black,
                    file: PathBuf::from("x.py"),
                    needs_formatting: true,
                    error: None,
                },
                CheckResult {
                    tool: Tool::Isort,
                    file: PathBuf::from("y.py"),
                    needs_formatting: true,
                    error: None,
                },
            ],
        };
        let result = orchestrator.remediate(&report, false).await;

        assert!(result.success);
        assert_eq!(result.issues_fixed, 2);
        assert!(protection.calls().contains(&ProtectionCall::Complete {
            tools: vec!["black".to_string(), "isort".to_string()],
            files: 2,
        }));
    }

    #[tokio::test]
    async fn test_protection_failure_aborts_before_any_edit() {
        let protection = MockProtection::new().with_protect_outcome(CommitOutcome::failed());
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection.clone()),
            quality(&["a.py"]),
            passing_verifier(&["a.py"]),
        );

        let result = orchestrator.remediate(&report_with_issues(&["a.py"]), false).await;

        assert!(!result.success);
        assert!(result.error.is_some());
        assert_eq!(op_kinds(&result), vec!["protect"]);
        // Only the protection attempt reached git.
        assert_eq!(protection.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_verification_failure_rolls_back_to_exact_hash() {
        let protection = MockProtection::new();
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection.clone()),
            quality(&["a.py"]),
            failing_verifier(&["a.py"]),
        );

        let result = orchestrator.remediate(&report_with_issues(&["a.py"]), false).await;

        assert!(!result.success);
        assert_eq!(result.issues_fixed, 0);
        assert_eq!(op_kinds(&result), vec!["protect", "format", "verify", "rollback"]);

        let calls = protection.calls();
        assert!(calls.contains(&ProtectionCall::Rollback {
            commit_hash: "protect-hash".to_string()
        }));
        assert!(!calls.iter().any(|c| matches!(c, ProtectionCall::Complete { .. })));
    }

    #[tokio::test]
    async fn test_completion_commit_failure_rolls_back() {
        let protection = MockProtection::new().with_complete_outcome(CommitOutcome::failed());
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection.clone()),
            quality(&["a.py"]),
            passing_verifier(&["a.py"]),
        );

        let result = orchestrator.remediate(&report_with_issues(&["a.py"]), false).await;

        assert!(!result.success);
        assert_eq!(
            op_kinds(&result),
            vec!["protect", "format", "verify", "commit", "rollback"]
        );
        assert!(protection.calls().contains(&ProtectionCall::Rollback {
            commit_hash: "protect-hash".to_string()
        }));
    }

    #[tokio::test]
    async fn test_sdk_path_skips_tool_formatting() {
        let protection = MockProtection::new();
        let assistant = MockAssistant::answering("fixed both files");
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection.clone()),
            quality(&["a.py"]),
            passing_verifier(&["a.py"]),
        )
        .with_assistant(Arc::new(assistant.clone()));

        let result = orchestrator.remediate(&report_with_issues(&["a.py"]), true).await;

        assert!(result.success);
        assert_eq!(result.issues_fixed, 1);
        assert!(result.sdk_result.is_some());
        assert_eq!(op_kinds(&result), vec!["protect", "sdk", "verify", "commit"]);
        assert_eq!(assistant.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_assistant_falls_back_to_tools() {
        let protection = MockProtection::new();
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection.clone()),
            quality(&["a.py"]),
            passing_verifier(&["a.py"]),
        )
        .with_assistant(Arc::new(MockAssistant::unavailable()));

        let result = orchestrator.remediate(&report_with_issues(&["a.py"]), true).await;

        assert!(result.success);
        assert_eq!(result.issues_fixed, 1);
        assert!(result.sdk_result.is_none());
        // Failed sdk attempt is recorded, then the tool path runs.
        assert_eq!(
            op_kinds(&result),
            vec!["protect", "sdk", "format", "verify", "commit"]
        );
    }

    #[tokio::test]
    async fn test_sdk_requested_without_assistant_configured() {
        let protection = MockProtection::new();
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection.clone()),
            quality(&["a.py"]),
            passing_verifier(&["a.py"]),
        );

        let result = orchestrator.remediate(&report_with_issues(&["a.py"]), true).await;

        assert!(result.success);
        assert_eq!(
            op_kinds(&result),
            vec!["protect", "sdk", "format", "verify", "commit"]
        );
    }

    #[tokio::test]
    async fn test_rollback_failure_still_reported_in_result() {
        let protection = MockProtection::new()
            .with_complete_outcome(CommitOutcome::failed())
            .with_rollback_outcome(RollbackOutcome { success: false });
        let orchestrator = RemediationOrchestrator::new(
            Arc::new(protection),
            quality(&["a.py"]),
            passing_verifier(&["a.py"]),
        );

        let result = orchestrator.remediate(&report_with_issues(&["a.py"]), false).await;

        assert!(!result.success);
        let rollback = result.operations.iter().find(|o| o.kind == "rollback").unwrap();
        assert!(!rollback.success);
    }

    #[tokio::test]
    async fn test_never_errors() {
        // Even a protection layer that errors outright is folded into the
        // result.
        struct ErroringProtection;

        #[async_trait]
        impl mend_git::GitProtection for ErroringProtection {
            async fn create_protection_commit(
                &self,
                _description: &str,
                _target_files: Option<&[PathBuf]>,
            ) -> Result<CommitOutcome> {
                Err(MendError::GitCommand("git exploded".to_string()))
            }

            async fn create_completion_commit(
                &self,
                _description: &str,
                _tools_executed: &[String],
                _files_modified: usize,
            ) -> Result<CommitOutcome> {
                Err(MendError::GitCommand("git exploded".to_string()))
            }

            async fn rollback_to_protection_commit(
                &self,
                _commit_hash: &str,
            ) -> Result<RollbackOutcome> {
                Err(MendError::GitCommand("git exploded".to_string()))
            }
        }

        let orchestrator = RemediationOrchestrator::new(
            Arc::new(ErroringProtection),
            quality(&["a.py"]),
            passing_verifier(&["a.py"]),
        );

        let result = orchestrator.remediate(&report_with_issues(&["a.py"]), false).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("git exploded"));
    }
}
