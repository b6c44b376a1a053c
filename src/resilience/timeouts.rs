//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap resolution, upstream calls and body I/O with a deadline
//! - Cancel operations cleanly on timeout (the inner future is dropped)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out upstream requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

/// An operation did not finish within its deadline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} timed out after {after:?}")]
pub struct TimeoutError {
    pub operation: &'static str,
    pub after: Duration,
}

/// Run `fut` with a deadline of `after`.
pub async fn with_timeout<F>(
    operation: &'static str,
    after: Duration,
    fut: F,
) -> Result<F::Output, TimeoutError>
where
    F: Future,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| TimeoutError { operation, after })
}
