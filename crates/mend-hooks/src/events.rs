//! Hook events and payload parsing
//!
//! The host CLI invokes mend with a JSON payload on stdin describing the
//! triggering event. The payload shape varies by host version, so parsing
//! is permissive: unknown fields are ignored and missing fields default to
//! `None`. Edited-file extraction prefers the structured `tool_input`
//! fields and falls back to scanning free text for path-like tokens.

use mend_core::{MendError, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pattern for path-like tokens with a Python extension
const PATH_TOKEN_PATTERN: &str = r"[A-Za-z0-9_\-./]+\.pyi?\b";

/// The three lifecycle events mend handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// After the assistant used an editing tool
    PostToolUse,
    /// A sub-agent finished its task
    SubagentStop,
    /// The session is ending
    Stop,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PostToolUse => "post_tool_use",
            HookEvent::SubagentStop => "subagent_stop",
            HookEvent::Stop => "stop",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed hook payload from the host CLI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<Value>,
    #[serde(default)]
    pub tool_response: Option<Value>,
}

impl HookInput {
    /// Parse a stdin payload; an empty payload is a valid empty input
    pub fn parse(payload: &str) -> Result<Self> {
        if payload.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(payload).map_err(|e| MendError::HookPayload(e.to_string()))
    }

    /// Fill missing identity fields from the host environment
    pub fn or_env(mut self) -> Self {
        if self.session_id.is_none() {
            self.session_id = std::env::var("CLAUDE_SESSION_ID").ok();
        }
        if self.tool_name.is_none() {
            self.tool_name = std::env::var("CLAUDE_TOOL_NAME").ok();
        }
        self
    }

    /// Extract the Python files this tool invocation edited
    ///
    /// Structured fields win: `tool_input.file_path` and the `file_path` of
    /// each entry in `tool_input.edits`. When neither yields anything, the
    /// payload is scanned as free text for path-like tokens, and only
    /// tokens that resolve to existing files under `project_root` are kept.
    pub fn edited_files(&self, project_root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        if let Some(input) = &self.tool_input {
            if let Some(path) = input.get("file_path").and_then(Value::as_str) {
                push_python_path(&mut files, project_root, path);
            }
            if let Some(edits) = input.get("edits").and_then(Value::as_array) {
                for edit in edits {
                    if let Some(path) = edit.get("file_path").and_then(Value::as_str) {
                        push_python_path(&mut files, project_root, path);
                    }
                }
            }
        }

        if files.is_empty() {
            self.scan_free_text(project_root, &mut files);
        }

        debug!("Extracted {} edited file(s) from payload", files.len());
        files
    }

    /// Best-effort free-text scan; only existing files are accepted
    fn scan_free_text(&self, project_root: &Path, files: &mut Vec<PathBuf>) {
        let Ok(pattern) = Regex::new(PATH_TOKEN_PATTERN) else {
            return;
        };

        let mut text = String::new();
        if let Some(input) = &self.tool_input {
            text.push_str(&input.to_string());
            text.push('\n');
        }
        if let Some(response) = &self.tool_response {
            text.push_str(&response.to_string());
        }

        for token in pattern.find_iter(&text) {
            let candidate = resolve(project_root, token.as_str());
            if candidate.is_file() && !files.contains(&candidate) {
                files.push(candidate);
            }
        }
    }
}

fn resolve(project_root: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}

fn is_python_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("py") | Some("pyi")
    )
}

fn push_python_path(files: &mut Vec<PathBuf>, project_root: &Path, raw: &str) {
    let path = resolve(project_root, raw);
    if is_python_path(&path) && !files.contains(&path) {
        files.push(path);
    }
}
