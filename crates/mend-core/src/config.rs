//! Configuration management for mend
//!
//! This module provides configuration structures for repository-level mend
//! settings, including formatter options, subprocess timeouts, assistant
//! model selection, and the cleanup watcher.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

/// Repository-level mend configuration
///
/// Loaded from `.mend/config.toml` in the repo root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MendConfig {
    /// Formatter invocation options
    #[serde(default)]
    pub formatting: FormattingConfig,

    /// Subprocess timeouts in seconds
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Assistant model selection
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Cleanup watcher behavior
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Formatter invocation options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattingConfig {
    /// Line length passed to the formatter
    #[serde(default = "default_line_length")]
    pub line_length: usize,

    /// Import-sorting profile
    #[serde(default = "default_isort_profile")]
    pub isort_profile: String,

    /// Glob patterns for files the quality pipeline covers
    #[serde(default = "default_include_patterns")]
    pub include_patterns: Vec<String>,
}

/// Subprocess timeouts in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_formatter_timeout")]
    pub formatter_secs: u64,

    #[serde(default = "default_compile_timeout")]
    pub compile_secs: u64,

    #[serde(default = "default_test_discovery_timeout")]
    pub test_discovery_secs: u64,

    #[serde(default = "default_assistant_timeout")]
    pub assistant_secs: u64,
}

/// Assistant model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Default model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable containing the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Maximum tokens for assistant responses
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

/// Cleanup watcher behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Per-file cooldown between cleanup runs, in seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

// Default value providers
fn default_line_length() -> usize {
    88
}

fn default_isort_profile() -> String {
    "black".to_string()
}

fn default_include_patterns() -> Vec<String> {
    vec!["**/*.py".to_string(), "**/*.pyi".to_string()]
}

fn default_formatter_timeout() -> u64 {
    60
}

fn default_compile_timeout() -> u64 {
    120
}

fn default_test_discovery_timeout() -> u64 {
    120
}

fn default_assistant_timeout() -> u64 {
    180
}

fn default_model() -> String {
    "claude-sonnet-4".to_string()
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_max_tokens() -> usize {
    16000
}

fn default_cooldown_secs() -> u64 {
    5
}

impl MendConfig {
    /// Load configuration from `.mend/config.toml` or use defaults
    pub fn load_or_default(repo_root: &Path) -> Result<Self> {
        let config_path = repo_root.join(".mend/config.toml");

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content).map_err(|e| {
                crate::MendError::Config(format!("Failed to parse config file: {}", e))
            })?)
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to `.mend/config.toml`
    pub fn write_default(repo_root: &Path) -> Result<()> {
        let config_dir = repo_root.join(".mend");
        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        let config = Self::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| crate::MendError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

impl Default for MendConfig {
    fn default() -> Self {
        Self {
            formatting: FormattingConfig::default(),
            timeouts: TimeoutConfig::default(),
            assistant: AssistantConfig::default(),
            watcher: WatcherConfig::default(),
        }
    }
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            line_length: default_line_length(),
            isort_profile: default_isort_profile(),
            include_patterns: default_include_patterns(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            formatter_secs: default_formatter_timeout(),
            compile_secs: default_compile_timeout(),
            test_discovery_secs: default_test_discovery_timeout(),
            assistant_secs: default_assistant_timeout(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}
