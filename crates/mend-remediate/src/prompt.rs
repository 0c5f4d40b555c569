//! Prompt builder for assistant-guided remediation
//!
//! Constructs a natural-language remediation plan from a quality report:
//! which files each tool flagged, and what the assistant is allowed to
//! change (formatting only, no behavior edits).

use mend_core::QualityReport;

/// Build a remediation plan prompt from a quality report
pub fn build_remediation_prompt(report: &QualityReport) -> String {
    let mut prompt = String::new();

    prompt.push_str("# CODE QUALITY REMEDIATION\n\n");
    prompt.push_str(&format!(
        "A quality check found {} issue(s) across {} file(s).\n\n",
        report.issues_found, report.files_checked
    ));

    prompt.push_str("## FLAGGED FILES\n\n");
    for check in &report.checks {
        if check.needs_formatting {
            prompt.push_str(&format!(
                "- `{}` flagged by {}\n",
                check.file.display(),
                check.tool
            ));
        }
    }
    prompt.push('\n');

    let errors: Vec<&str> = report
        .checks
        .iter()
        .filter_map(|c| c.error.as_deref())
        .collect();
    if !errors.is_empty() {
        prompt.push_str("## CHECK ERRORS\n\n");
        for error in errors {
            prompt.push_str(&format!("- {}\n", error));
        }
        prompt.push('\n');
    }

    prompt.push_str("## INSTRUCTIONS\n\n");
    prompt.push_str(
        "Fix ONLY the formatting and import-ordering issues listed above.\n\
         - Do not change program behavior\n\
         - Do not rename identifiers or edit comments\n\
         - Preserve existing line endings\n\
         - After editing, every file must still parse\n",
    );

    prompt
}
