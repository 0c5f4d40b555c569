//! Opt-in retry helper for flaky external commands
//!
//! Fixed attempt count, fixed delay, no backoff. Retries only commands
//! whose caller explicitly opted in; nothing else in mend retries.

use std::time::Duration;
use tracing::warn;

use crate::runner::{ProcessExecutor, ProcessOutput};
use mend_core::Result;

/// Run a command up to `attempts` times, sleeping `delay` between failures
///
/// A non-success output (including a timeout) counts as a failed attempt.
/// The last output is returned whether or not it succeeded; an `Err` is
/// only returned when the command could not be spawned at all.
pub async fn run_with_retry<E: ProcessExecutor + ?Sized>(
    executor: &E,
    program: &str,
    args: &[&str],
    timeout: Duration,
    attempts: usize,
    delay: Duration,
) -> Result<ProcessOutput> {
    let attempts = attempts.max(1);
    let mut last = ProcessOutput::failed("no attempts made");

    for attempt in 1..=attempts {
        last = executor.run(program, args, timeout).await?;
        if last.success {
            return Ok(last);
        }

        if attempt < attempts {
            warn!(
                "{} failed (attempt {}/{}), retrying in {}ms",
                program,
                attempt,
                attempts,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::MockProcessExecutor;

    #[tokio::test]
    async fn test_retry_returns_first_success() {
        let executor = MockProcessExecutor::new().with_response(
            "true",
            ProcessOutput {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
                timed_out: false,
            },
        );

        let output = run_with_retry(
            &executor,
            "true",
            &[],
            Duration::from_secs(1),
            3,
            Duration::from_millis(1),
        )
        .await
        .unwrap();
        assert!(output.success);
    }

    #[tokio::test]
    async fn test_retry_exhausts_attempts() {
        let executor = MockProcessExecutor::new()
            .with_response("false", ProcessOutput::failed("always fails"));

        let output = run_with_retry(
            &executor,
            "false",
            &[],
            Duration::from_secs(1),
            2,
            Duration::from_millis(1),
        )
        .await
        .unwrap();
        assert!(!output.success);
        assert_eq!(output.stderr, "always fails");
    }
}
