//! Unified error types for mend

use thiserror::Error;

/// Unified error type for all mend operations
#[derive(Error, Debug)]
pub enum MendError {
    // Process errors
    #[error("Process execution failed: {0}")]
    Process(String),

    #[error("Process timed out: {0}")]
    ProcessTimeout(String),

    // Git errors
    #[error("Git command failed: {0}")]
    GitCommand(String),

    #[error("Protection commit unavailable: {0}")]
    ProtectionUnavailable(String),

    // Formatter errors
    #[error("Formatter error: {0}")]
    Formatter(String),

    // Quality errors
    #[error("Quality check error: {0}")]
    Quality(String),

    #[error("Verification error: {0}")]
    Verification(String),

    // Remediation errors
    #[error("Remediation error: {0}")]
    Remediation(String),

    // Assistant errors
    #[error("Assistant error: {0}")]
    Assistant(String),

    #[error("Assistant unavailable: {0}")]
    AssistantUnavailable(String),

    // Hook errors
    #[error("Hook error: {0}")]
    Hook(String),

    #[error("Invalid hook payload: {0}")]
    HookPayload(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using MendError
pub type Result<T> = std::result::Result<T, MendError>;
