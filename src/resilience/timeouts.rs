//! Request-scoped deadlines.
//!
//! An elapsed deadline means no response was received, so it is reported the
//! same way as a dropped connection.

use std::future::Future;
use std::time::Duration;

use crate::network::{NetworkError, NetworkResult};

/// Run `fut` under `deadline`, mapping expiry to [`NetworkError::Down`].
pub async fn with_deadline<T, F>(deadline: Duration, url: &str, fut: F) -> NetworkResult<T>
where
    F: Future<Output = NetworkResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(url = %url, timeout_ms = deadline.as_millis() as u64, "Request deadline elapsed");
            Err(NetworkError::Down {
                url: url.to_string(),
            })
        }
    }
}
