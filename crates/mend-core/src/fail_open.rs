//! Fail-open utilities for graceful degradation
//!
//! Hooks must never crash the host CLI over infrastructure failures. Use
//! these for logging, session tracking, and cleanup.
//!
//! DO NOT use fail-open for:
//! - The remediation cycle itself (protection/rollback correctness)
//! - Verification checks
//! - Git protection commits

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an operation that should fail open (infrastructure, not business logic)
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} failed (fail-open): {}", operation_name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MendError;

    #[tokio::test]
    async fn test_fail_open_success() {
        let result = fail_open("test_op", || async { Ok::<_, MendError>(42) }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn test_fail_open_failure() {
        let result = fail_open("test_op", || async {
            Err::<i32, _>(MendError::Other("test error".to_string()))
        })
        .await;
        assert_eq!(result, None);
    }
}
