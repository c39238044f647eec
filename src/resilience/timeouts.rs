//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap database calls with a deadline
//! - Keep timeout errors distinct from the operation's own errors
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The wrapped future is dropped (cancelled) when the deadline passes

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Outcome of a bounded operation that did not succeed.
#[derive(Debug, Error)]
pub enum Bounded<E> {
    #[error("operation timed out after {0:?}")]
    Elapsed(Duration),

    #[error(transparent)]
    Failed(E),
}

/// Run `operation`, failing with [`Bounded::Elapsed`] if it outlives `limit`.
pub async fn with_timeout<F, T, E>(limit: Duration, operation: F) -> Result<T, Bounded<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Bounded::Failed(e)),
        Err(_) => Err(Bounded::Elapsed(limit)),
    }
}
