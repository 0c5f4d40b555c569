//! # mend-core
//!
//! Core types for the mend hook system.
//!
//! mend is a set of lifecycle hooks for an AI coding assistant CLI: small
//! commands triggered on tool use, sub-agent completion, and session end,
//! which orchestrate formatter runs, Unicode cleanup, and git-protected
//! remediation.
//!
//! ## Core paradigm
//!
//! - Quality state IS a report (one record per file/tool pair)
//! - Remediation IS a protected transaction (checkpoint, fix, verify,
//!   commit-or-rollback)
//! - Hooks never crash the host: infrastructure failures fail open,
//!   business failures surface as tagged results

#![allow(dead_code)]

mod config;
mod error;
mod paths;
mod types;

pub mod fail_open;

pub use config::{AssistantConfig, FormattingConfig, MendConfig, TimeoutConfig, WatcherConfig};
pub use error::{MendError, Result};
pub use paths::PathResolver;
pub use types::*;
