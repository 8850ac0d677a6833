//! Async retry loops on tokio
//!
//! Same semantics as the blocking loops, with the wait between attempts
//! performed by `tokio::time::sleep` so the task yields instead of blocking
//! its thread. [`retry_notify_until`] additionally races each wait against a
//! caller-supplied cancellation future.

use std::future::{self, Future};
use std::num::NonZeroU32;

use crate::backoff::Backoff;

use super::error::RetryError;
use super::notify::{NoopNotify, Notify};

/// Async counterpart of [`retry`](super::retry)
pub async fn retry_async<F, Fut, T, E, B>(operation: F, backoff: B) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Backoff,
{
    run(operation, backoff, NoopNotify, None, future::pending())
        .await
        .map_err(RetryError::into_inner)
}

/// Async counterpart of [`retry_notify`](super::retry_notify)
pub async fn retry_notify_async<F, Fut, T, E, B, N>(
    operation: F,
    backoff: B,
    notify: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Backoff,
    N: Notify<E>,
{
    run(operation, backoff, notify, None, future::pending())
        .await
        .map_err(RetryError::into_inner)
}

/// Async counterpart of [`retry_n_notify`](super::retry_n_notify)
pub async fn retry_n_notify_async<F, Fut, T, E, B, N>(
    max_attempts: NonZeroU32,
    backoff: B,
    notify: N,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Backoff,
    N: Notify<E>,
{
    run(
        operation,
        backoff,
        notify,
        Some(max_attempts),
        future::pending(),
    )
    .await
    .map_err(RetryError::into_inner)
}

/// Retry with notifications until success, backoff stop, or cancellation
///
/// `cancel` is polled only while the loop waits between attempts. If it
/// completes first the wait is abandoned and the call returns
/// [`RetryError::Cancelled`] carrying the error of the last attempt. An
/// attempt already in flight is never interrupted.
///
/// `notify` runs before each wait starts, so the last notification may
/// announce a wait that cancellation then cuts short or skips entirely.
///
/// # Example
///
/// ```rust
/// use rebound_core::backoff::ConstantBackoff;
/// use rebound_core::retry::{retry_notify_until, NoopNotify};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
/// drop(stop);
///
/// let result: Result<(), _> = retry_notify_until(
///     || async { Err::<(), _>(std::io::Error::other("unreachable host")) },
///     ConstantBackoff::new(Duration::from_secs(3600)),
///     NoopNotify,
///     async {
///         let _ = stopped.await;
///     },
/// )
/// .await;
///
/// assert!(result.unwrap_err().is_cancelled());
/// # }
/// ```
pub async fn retry_notify_until<F, Fut, T, E, B, N, C>(
    operation: F,
    backoff: B,
    notify: N,
    cancel: C,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Backoff,
    N: Notify<E>,
    C: Future<Output = ()>,
{
    run(operation, backoff, notify, None, cancel).await
}

async fn run<F, Fut, T, E, B, N, C>(
    mut operation: F,
    mut backoff: B,
    mut notify: N,
    max_attempts: Option<NonZeroU32>,
    cancel: C,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Backoff,
    N: Notify<E>,
    C: Future<Output = ()>,
{
    tokio::pin!(cancel);

    backoff.reset();
    notify.reset();
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if max_attempts.is_some_and(|max| attempt >= max.get()) {
            tracing::debug!(attempt, "attempt cap reached, giving up");
            return Err(RetryError::Failed(err));
        }

        let Some(wait) = backoff.next_backoff() else {
            tracing::debug!(attempt, "backoff stopped, giving up");
            return Err(RetryError::Failed(err));
        };

        notify.notify(&err, wait);

        tokio::select! {
            biased;

            _ = &mut cancel => {
                tracing::debug!(attempt, "retry cancelled while waiting");
                return Err(RetryError::cancelled(attempt, err));
            }
            _ = tokio::time::sleep(wait) => {}
        }
    }
}
