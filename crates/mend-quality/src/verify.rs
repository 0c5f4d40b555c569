//! Post-remediation verification probe
//!
//! Two lightweight signals: a compile/parse pass over the affected sources
//! and a test-discovery pass (collection only, never execution).
//! Compilation is the authoritative gate; test discovery is advisory and
//! only recorded for the session log.

use mend_core::Result;
use mend_process::ProcessExecutor;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(120);

/// Result of one verification pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verification {
    pub compiled: bool,
    pub tests_discovered: bool,
    /// Authoritative outcome; equals `compiled`
    pub success: bool,
}

/// Runs the compile and test-discovery probes
pub struct Verifier {
    executor: Arc<dyn ProcessExecutor>,
    compile_timeout: Duration,
    discovery_timeout: Duration,
}

impl Verifier {
    pub fn new(executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            executor,
            compile_timeout: DEFAULT_COMPILE_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, compile: Duration, discovery: Duration) -> Self {
        self.compile_timeout = compile;
        self.discovery_timeout = discovery;
        self
    }

    /// Verify the affected sources
    pub async fn verify(&self, paths: &[PathBuf]) -> Result<Verification> {
        let compiled = self.check_compilation(paths).await;
        let tests_discovered = self.check_test_discovery().await;

        Ok(Verification {
            compiled,
            tests_discovered,
            success: compiled,
        })
    }

    /// Compile/parse all affected sources via `python -m py_compile`
    ///
    /// An unavailable interpreter degrades to a no-op pass: that is a
    /// tool-unavailable condition, not a compilation failure.
    async fn check_compilation(&self, paths: &[PathBuf]) -> bool {
        if paths.is_empty() {
            return true;
        }

        let path_args: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        let mut args: Vec<&str> = vec!["-m", "py_compile"];
        args.extend(path_args.iter().map(String::as_str));

        match self.executor.run("python", &args, self.compile_timeout).await {
            Ok(output) => {
                if !output.success {
                    debug!("Compilation check failed: {}", output.stderr.trim());
                }
                output.success
            }
            Err(e) => {
                warn!("Compilation check unavailable, skipping: {}", e);
                true
            }
        }
    }

    /// Attempt test discovery via `pytest --collect-only -q`
    async fn check_test_discovery(&self) -> bool {
        match self
            .executor
            .run("pytest", &["--collect-only", "-q"], self.discovery_timeout)
            .await
        {
            Ok(output) => output.success,
            Err(e) => {
                warn!("Test discovery unavailable: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_process::{MockProcessExecutor, ProcessOutput};

    fn ok() -> ProcessOutput {
        ProcessOutput {
            stdout: String::new(),
            stderr: String::new(),
            success: true,
            timed_out: false,
        }
    }

    fn failed(stderr: &str) -> ProcessOutput {
        ProcessOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            success: false,
            timed_out: false,
        }
    }

    #[tokio::test]
    async fn test_verification_passes_when_compile_passes() {
        let executor = MockProcessExecutor::new()
            .with_response("python -m py_compile x.py", ok())
            .with_response("pytest --collect-only -q", ok());

        let verifier = Verifier::new(Arc::new(executor));
        let result = verifier.verify(&[PathBuf::from("x.py")]).await.unwrap();

        assert!(result.compiled);
        assert!(result.tests_discovered);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_compile_failure_is_authoritative() {
        let executor = MockProcessExecutor::new()
            .with_response(
                "python -m py_compile x.py",
                failed("SyntaxError: invalid syntax"),
            )
            .with_response("pytest --collect-only -q", ok());

        let verifier = Verifier::new(Arc::new(executor));
        let result = verifier.verify(&[PathBuf::from("x.py")]).await.unwrap();

        assert!(!result.compiled);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_discovery_failure_is_advisory_only() {
        let executor = MockProcessExecutor::new()
            .with_response("python -m py_compile x.py", ok())
            .with_response("pytest --collect-only -q", failed("collection error"));

        let verifier = Verifier::new(Arc::new(executor));
        let result = verifier.verify(&[PathBuf::from("x.py")]).await.unwrap();

        assert!(result.compiled);
        assert!(!result.tests_discovered);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_missing_interpreter_degrades_to_pass() {
        // No mock responses at all: both probes are unavailable.
        let verifier = Verifier::new(Arc::new(MockProcessExecutor::new()));
        let result = verifier.verify(&[PathBuf::from("x.py")]).await.unwrap();

        assert!(result.compiled);
        assert!(!result.tests_discovered);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_empty_file_set_compiles_trivially() {
        let executor = MockProcessExecutor::new().with_response("pytest --collect-only -q", ok());

        let verifier = Verifier::new(Arc::new(executor));
        let result = verifier.verify(&[]).await.unwrap();

        assert!(result.success);
    }
}
