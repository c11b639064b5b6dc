//! Bounded execution of blocking capability calls.
//!
//! External capabilities are synchronous. Async callers run them on the
//! tokio blocking pool and give up after a per-capability timeout. A call
//! that times out keeps running on its worker thread; its result is dropped.

use std::time::Duration;

use crate::errors::{RelayError, RelayResult};

/// Run `f` on the blocking pool, bounded by `timeout`.
pub async fn call_blocking<T, F>(capability: &'static str, timeout: Duration, f: F) -> RelayResult<T>
where
    F: FnOnce() -> RelayResult<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            tracing::error!(
                capability,
                panicked = join_error.is_panic(),
                "capability call did not complete"
            );
            Err(RelayError::CapabilityPanicked {
                capability: capability.to_string(),
            })
        }
        Err(_elapsed) => {
            let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(capability, timeout_ms, "capability call timed out");
            Err(RelayError::Timeout {
                capability: capability.to_string(),
                timeout_ms,
            })
        }
    }
}
