//! # mend-process
//!
//! Timeout-bounded subprocess execution for mend.
//!
//! This crate provides:
//! - A process executor abstraction with a mock for tests
//! - Structured success/stdout/stderr/timeout results
//! - An opt-in fixed-delay retry helper

#![allow(dead_code)]

mod retry;
mod runner;

pub use retry::run_with_retry;
pub use runner::{MockProcessExecutor, ProcessExecutor, ProcessOutput, ProcessRunner};
