//! # mend-git
//!
//! Git integration layer for mend.
//!
//! This crate provides:
//! - Git command execution abstraction
//! - Protection commits before automated remediation
//! - Completion commits and rollback to checkpoints

#![allow(dead_code)]

mod command;
mod protection;

pub use command::{GitCommand, GitExecutor, GitOutput, MockGitExecutor};
pub use protection::{GitProtection, MockProtection, ProtectionCall, ProtectionManager};
