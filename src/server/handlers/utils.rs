use std::future::Future;
use std::time::Duration;

use crate::core::errors::ApiError;

/// Runs `fut` under the configured per-request deadline.
///
/// On expiry the future is dropped: nothing is rolled back, so a store write
/// that committed before the deadline stays committed.
pub async fn with_deadline<F, T>(timeout: Duration, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "request abandoned after deadline");
            Err(ApiError::Timeout(timeout.as_secs()))
        }
    }
}
