//! # mend-quality
//!
//! Quality check orchestration for mend.
//!
//! This crate provides:
//! - A sequential quality orchestrator aggregating formatter checks into
//!   reports
//! - Write-mode formatting over flagged file sets
//! - The post-remediation verification probe (compile + test discovery)

#![allow(dead_code)]

mod orchestrator;
mod verify;

pub use orchestrator::{FormatSummary, QualityOrchestrator};
pub use verify::{Verification, Verifier};
