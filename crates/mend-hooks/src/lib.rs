//! # mend-hooks
//!
//! Lifecycle hook dispatch for mend: payload parsing, the main
//! orchestrator over the three hook events, the session JSON-lines log,
//! the touched-file tracker, and the auxiliary cleanup watcher.

#![allow(dead_code)]

mod dispatch;
mod events;
mod session_log;
mod tracker;
mod watcher;

pub use dispatch::{HookSummary, MainOrchestrator};
pub use events::{HookEvent, HookInput};
pub use session_log::SessionLog;
pub use tracker::SessionTracker;
pub use watcher::CleanupWatcher;
