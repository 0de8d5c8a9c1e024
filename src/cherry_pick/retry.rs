//! Single-retry wrapper for host calls

use crate::error::Result;
use std::future::Future;
use tracing::warn;

/// Run `call`, retrying once if it fails with a transient error
///
/// Non-transient errors and a second transient failure are returned as-is.
pub async fn with_retry<T, F, Fut>(operation: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match call().await {
        Err(e) if e.is_transient() => {
            warn!(operation, error = %e, "transient failure, retrying once");
            call().await
        }
        other => other,
    }
}
