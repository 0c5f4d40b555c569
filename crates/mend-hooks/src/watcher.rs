//! Auxiliary file watcher
//!
//! Watches project sources and runs Unicode cleanup on files as they
//! change, recording them in the session tracker. The per-file cooldown is
//! best-effort de-duplication, not a correctness guarantee: an event may
//! still slip through while a spawned cleanup task is in flight, and the
//! cleanup itself is idempotent so that is acceptable.

use mend_core::fail_open::fail_open;
use mend_core::{MendError, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::tracker::SessionTracker;

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Directories whose events are never processed
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".mend",
    ".venv",
    "venv",
    "__pycache__",
    "node_modules",
];

/// Background cleanup watcher over a project tree
pub struct CleanupWatcher {
    project_root: PathBuf,
    cooldown: Duration,
    tracker: Arc<SessionTracker>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl CleanupWatcher {
    pub fn new(project_root: impl Into<PathBuf>, tracker: Arc<SessionTracker>) -> Self {
        Self {
            project_root: project_root.into(),
            cooldown: DEFAULT_COOLDOWN,
            tracker,
            shutdown_tx: None,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Watch until `stop()` is called
    pub async fn run(&mut self) -> Result<()> {
        info!("Watching {} for source changes", self.project_root.display());

        let (fs_tx, fs_rx) = std::sync::mpsc::channel();
        let (event_tx, mut event_rx) = mpsc::channel(100);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        self.shutdown_tx = Some(shutdown_tx);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                if let Err(e) = fs_tx.send(res) {
                    error!("Failed to forward file event: {}", e);
                }
            },
            Config::default(),
        )
        .map_err(|e| MendError::Hook(e.to_string()))?;

        watcher
            .watch(&self.project_root, RecursiveMode::Recursive)
            .map_err(|e| MendError::Hook(e.to_string()))?;

        // Bridge the sync notify channel into the async loop
        tokio::task::spawn_blocking(move || {
            while let Ok(res) = fs_rx.recv() {
                match res {
                    Ok(event) => {
                        if event_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => error!("File watcher error: {}", e),
                }
            }
        });

        let mut last_seen: HashMap<PathBuf, Instant> = HashMap::new();

        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    self.handle_event(event, &mut last_seen);
                }
                _ = shutdown_rx.recv() => {
                    info!("Watcher received shutdown signal");
                    break;
                }
            }
        }

        drop(watcher);
        info!("Watcher stopped");
        Ok(())
    }

    /// Stop the watcher gracefully
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
    }

    fn handle_event(&self, event: Event, last_seen: &mut HashMap<PathBuf, Instant>) {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return;
        }

        let now = Instant::now();
        for path in event.paths {
            if !should_process(&path, last_seen, self.cooldown, now) {
                continue;
            }
            last_seen.insert(path.clone(), now);

            debug!("Scheduling cleanup for {}", path.display());
            let tracker = self.tracker.clone();
            tokio::spawn(async move {
                fail_open("watcher::cleanup", || async {
                    mend_format::cleanup::clean_file(&path).await?;
                    tracker.record(&path).await
                })
                .await;
            });
        }
    }
}

/// Event filter: Python source, outside ignored dirs, cooldown elapsed
fn should_process(
    path: &Path,
    last_seen: &HashMap<PathBuf, Instant>,
    cooldown: Duration,
    now: Instant,
) -> bool {
    let is_python = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("py") | Some("pyi")
    );
    if !is_python || is_ignored(path) {
        return false;
    }

    match last_seen.get(path) {
        Some(seen) => now.duration_since(*seen) >= cooldown,
        None => true,
    }
}

fn is_ignored(path: &Path) -> bool {
    path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| IGNORED_DIRS.contains(&s))
            .unwrap_or(false)
    })
}
