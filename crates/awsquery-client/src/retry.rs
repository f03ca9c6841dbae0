//! Fixed-count retry of throttled calls.

use tracing::warn;

use crate::error::{ClientError, ClientResult};

/// Call `op` up to `attempts` times while it fails with a throttling error.
///
/// Other errors are returned immediately. There is no backoff between
/// attempts; callers that need one sleep inside `op`.
///
/// # Errors
///
/// Returns the last error once the attempts are used up, or the first
/// non-throttling error.
pub fn with_retry<T, F>(attempts: u32, mut op: F) -> ClientResult<T>
where
    F: FnMut() -> ClientResult<T>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Err(error) if error.is_throttling() && attempt < attempts => {
                warn!(attempt, attempts, error = %error, "request throttled, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Whether an error would be retried by [`with_retry`].
#[must_use]
pub fn is_retryable(error: &ClientError) -> bool {
    error.is_throttling()
}
