//! Per-attempt deadlines
//!
//! An attempt that outlives its deadline is abandoned: the future is dropped
//! at the deadline and never polled again. Anything it already set in motion
//! elsewhere (a request on the wire, a spawned task) keeps running, so a
//! retried attempt may overlap with the remote side of the abandoned one.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Run `operation`, abandoning it once `limit` elapses
///
/// With no limit the operation runs to completion.
///
/// ```rust
/// use agentic_task::timeout::{with_timeout, TimeoutError};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let result = with_timeout(Some(Duration::from_millis(10)), async {
///     tokio::time::sleep(Duration::from_secs(10)).await;
///     Ok::<_, String>("done")
/// })
/// .await;
///
/// assert!(matches!(result, Err(TimeoutError::Elapsed(_))));
/// # }
/// ```
pub async fn with_timeout<F, T, E>(
    limit: Option<Duration>,
    operation: F,
) -> std::result::Result<T, TimeoutError<E>>
where
    F: Future<Output = std::result::Result<T, E>>,
{
    let Some(limit) = limit else {
        return operation.await.map_err(TimeoutError::Failed);
    };

    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result.map_err(TimeoutError::Failed),
        Err(_) => Err(TimeoutError::Elapsed(limit)),
    }
}

/// Why a bounded attempt produced no value
#[derive(Debug, PartialEq, Eq)]
pub enum TimeoutError<E> {
    /// The deadline passed and the attempt was dropped
    Elapsed(Duration),
    /// The attempt finished in time with an error
    Failed(E),
}

impl<E: fmt::Display> fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elapsed(limit) => write!(f, "attempt abandoned after {:?}", limit),
            Self::Failed(e) => e.fmt(f),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for TimeoutError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Elapsed(_) => None,
            Self::Failed(e) => Some(e),
        }
    }
}
