//! # mend-format
//!
//! Formatter adapters and Unicode cleanup for mend.
//!
//! This crate provides:
//! - A formatter adapter trait with black and isort implementations
//! - Best-effort parsing of formatter text output into structured results
//! - Unicode cleanup of edited source files

#![allow(dead_code)]

mod black;
mod formatter;
mod isort;

pub mod cleanup;
pub mod parse;

pub use black::BlackFormatter;
pub use formatter::{FormatOutcome, Formatter};
pub use isort::IsortFormatter;
