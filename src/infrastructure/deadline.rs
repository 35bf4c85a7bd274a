// Request deadlines - bounded wait on every service call

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Fail with `TimeoutError` once `limit` elapses. The caller decides
/// whether to retry; nothing here does.
pub async fn with_deadline<T, F>(limit: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::TimeoutError(format!(
            "{} exceeded {}ms",
            operation,
            limit.as_millis()
        ))),
    }
}
