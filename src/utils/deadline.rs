use crate::error::{Result, YawiError};
use std::future::Future;
use std::time::Duration;

/// Runs an I/O step under a deadline, mapping both failure kinds to
/// [`YawiError::Connection`] with the same context string.
pub async fn with_deadline<T, F>(timeout: Duration, context: &str, step: F) -> Result<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    match tokio::time::timeout(timeout, step).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(YawiError::connection(context, e)),
        Err(_) => Err(YawiError::timed_out(format!("{context} (timed out after {timeout:?})"))),
    }
}
