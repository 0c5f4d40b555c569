//! Main hook orchestrator
//!
//! Dispatches the three lifecycle events to the quality and remediation
//! layers. All collaborators are resolved once at construction; `handle`
//! never returns an error. Internal failures are logged with the error
//! chain and surface only as `success = false` so the binary can map them
//! to its exit code.

use mend_core::fail_open::fail_open;
use mend_core::{RemediationResult, Result};
use mend_format::cleanup;
use mend_quality::QualityOrchestrator;
use mend_remediate::RemediationOrchestrator;
use std::path::PathBuf;
use tracing::{error, info};

use crate::events::{HookEvent, HookInput};
use crate::session_log::SessionLog;
use crate::tracker::SessionTracker;

/// What one hook invocation did
#[derive(Debug)]
pub struct HookSummary {
    pub event: HookEvent,
    pub success: bool,
    pub files_checked: usize,
    pub issues_found: usize,
    pub files_cleaned: usize,
    pub remediation: Option<RemediationResult>,
}

impl HookSummary {
    fn empty(event: HookEvent) -> Self {
        Self {
            event,
            success: true,
            files_checked: 0,
            issues_found: 0,
            files_cleaned: 0,
            remediation: None,
        }
    }
}

/// Hook entrypoint over the quality and remediation layers
pub struct MainOrchestrator {
    quality: QualityOrchestrator,
    remediation: RemediationOrchestrator,
    session_log: SessionLog,
    tracker: SessionTracker,
    project_root: PathBuf,
    use_sdk: bool,
}

impl MainOrchestrator {
    pub fn new(
        quality: QualityOrchestrator,
        remediation: RemediationOrchestrator,
        session_log: SessionLog,
        tracker: SessionTracker,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            quality,
            remediation,
            session_log,
            tracker,
            project_root: project_root.into(),
            use_sdk: false,
        }
    }

    /// Prefer assistant-guided remediation when issues are found
    pub fn with_sdk(mut self) -> Self {
        self.use_sdk = true;
        self
    }

    /// Handle one hook event; never errors past this boundary
    pub async fn handle(&self, event: HookEvent, input: &HookInput) -> HookSummary {
        info!("Handling {} hook", event);

        let outcome = match event {
            HookEvent::PostToolUse => self.post_tool_use(input).await,
            HookEvent::SubagentStop => self.subagent_stop().await,
            HookEvent::Stop => self.stop(input).await,
        };

        match outcome {
            Ok(summary) => summary,
            Err(e) => {
                error!("{} hook failed: {}", event, e);
                let mut summary = HookSummary::empty(event);
                summary.success = false;
                self.session_log.log_hook(event.as_str(), 0, 0).await;
                summary
            }
        }
    }

    /// Clean and check exactly the files this tool invocation edited
    async fn post_tool_use(&self, input: &HookInput) -> Result<HookSummary> {
        let files = input.edited_files(&self.project_root);
        if files.is_empty() {
            info!("No edited Python files in payload, nothing to do");
            return Ok(HookSummary::empty(HookEvent::PostToolUse));
        }

        let cleaned = fail_open("post_tool_use::cleanup", || async {
            cleanup::clean_files(&files).await
        })
        .await
        .unwrap_or_default();

        for file in &files {
            fail_open("post_tool_use::track", || async {
                self.tracker.record(file).await
            })
            .await;
        }

        let report = self.quality.check_files(&files).await?;
        self.session_log
            .log_hook(HookEvent::PostToolUse.as_str(), report.files_checked, report.issues_found)
            .await;

        Ok(HookSummary {
            event: HookEvent::PostToolUse,
            // Issues at edit time are advisory; remediation happens at
            // SubagentStop.
            success: true,
            files_checked: report.files_checked,
            issues_found: report.issues_found,
            files_cleaned: cleaned.len(),
            remediation: None,
        })
    }

    /// Whole-project check; remediate when anything is flagged
    async fn subagent_stop(&self) -> Result<HookSummary> {
        let report = self.quality.check_project().await?;
        self.session_log
            .log_hook(HookEvent::SubagentStop.as_str(), report.files_checked, report.issues_found)
            .await;

        if report.issues_found == 0 {
            return Ok(HookSummary {
                event: HookEvent::SubagentStop,
                success: true,
                files_checked: report.files_checked,
                issues_found: 0,
                files_cleaned: 0,
                remediation: None,
            });
        }

        let result = self.remediation.remediate(&report, self.use_sdk).await;
        self.session_log.log_remediation(&result).await;

        Ok(HookSummary {
            event: HookEvent::SubagentStop,
            success: result.success,
            files_checked: report.files_checked,
            issues_found: report.issues_found,
            files_cleaned: 0,
            remediation: Some(result),
        })
    }

    /// Final check, final cleanup of session-touched files, summary record
    async fn stop(&self, input: &HookInput) -> Result<HookSummary> {
        let report = self.quality.check_project().await?;

        let touched = self.tracker.recent_files().await;
        let cleaned = fail_open("stop::cleanup", || async {
            cleanup::clean_files(&touched).await
        })
        .await
        .unwrap_or_default();

        self.session_log
            .log_summary(
                input.session_id.as_deref(),
                report.files_checked,
                report.issues_found,
                cleaned.len(),
            )
            .await;

        Ok(HookSummary {
            event: HookEvent::Stop,
            success: true,
            files_checked: report.files_checked,
            issues_found: report.issues_found,
            files_cleaned: cleaned.len(),
            remediation: None,
        })
    }
}
