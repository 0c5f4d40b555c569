//! # mend-remediate
//!
//! The git-protected remediation cycle: protect, remediate, verify, then
//! commit or roll back. Remediation can run through the formatting tools
//! directly or through an assistant, with automatic fallback to the tools
//! when the assistant is unavailable.

#![allow(dead_code)]

mod assistant;
mod prompt;
mod remediation;

pub use assistant::{ApiAssistant, Assistant, MockAssistant};
pub use prompt::build_remediation_prompt;
pub use remediation::RemediationOrchestrator;
