//! Timeout enforcement.
//!
//! Wraps upstream calls in `tokio::time::timeout`. A timed-out call is
//! dropped, which cancels the in-flight request.

use std::future::Future;
use std::time::Duration;

use crate::error::ProxyError;

/// Run `call`, failing with `UpstreamTimeout` if it outlives `deadline`.
pub async fn with_deadline<F, T>(deadline: Duration, call: F) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, ProxyError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ProxyError::UpstreamTimeout(deadline)),
    }
}
