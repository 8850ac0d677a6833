//! Blocking retry loops
//!
//! This module provides the retry loop itself, driven by a [`Backoff`],
//! plus the free functions most callers use.

use std::num::NonZeroU32;

use crate::backoff::Backoff;

use super::notify::{NoopNotify, Notify};
use super::sleep::{Sleeper, ThreadSleeper};

/// Retry `operation` until it succeeds or `backoff` stops
///
/// The operation always runs at least once. Between attempts the calling
/// thread sleeps for the wait produced by the backoff. When the backoff
/// returns `None` the most recent error is returned as-is.
///
/// With a backoff that never stops and an operation that never succeeds
/// this call never returns.
///
/// # Example
///
/// ```rust
/// use rebound_core::backoff::ZeroBackoff;
/// use rebound_core::retry::retry;
///
/// let mut calls = 0;
/// let result = retry(
///     || {
///         calls += 1;
///         if calls < 3 { Err("busy") } else { Ok(calls) }
///     },
///     ZeroBackoff,
/// );
/// assert_eq!(result, Ok(3));
/// ```
pub fn retry<F, T, E, B>(operation: F, backoff: B) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    B: Backoff,
{
    RetryExecutorBuilder::new(backoff).build().execute(operation)
}

/// Like [`retry`], calling `notify` with the error and the upcoming wait
/// before each sleep
///
/// # Example
///
/// ```rust
/// use rebound_core::backoff::{ConstantBackoff, WithMaxRetries};
/// use rebound_core::retry::retry_notify;
/// use std::time::Duration;
///
/// let mut waits = Vec::new();
/// let result: Result<(), &str> = retry_notify(
///     || Err("unavailable"),
///     WithMaxRetries::new(ConstantBackoff::new(Duration::from_millis(1)), 2),
///     |_err: &&str, wait: Duration| waits.push(wait),
/// );
/// assert_eq!(result, Err("unavailable"));
/// assert_eq!(waits.len(), 2);
/// ```
pub fn retry_notify<F, T, E, B, N>(operation: F, backoff: B, notify: N) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    B: Backoff,
    N: Notify<E>,
{
    RetryExecutorBuilder::new(backoff)
        .with_notify(notify)
        .build()
        .execute(operation)
}

/// Like [`retry`], but makes at most `max_attempts` attempts
///
/// The attempt that reaches the cap returns its error without consulting
/// the backoff again. A backoff that stops earlier ends the loop earlier.
pub fn retry_n<F, T, E, B>(max_attempts: NonZeroU32, backoff: B, operation: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    B: Backoff,
{
    RetryExecutorBuilder::new(backoff)
        .with_max_attempts(max_attempts)
        .build()
        .execute(operation)
}

/// Like [`retry_n`], with a notification before each sleep
pub fn retry_n_notify<F, T, E, B, N>(
    max_attempts: NonZeroU32,
    backoff: B,
    notify: N,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    B: Backoff,
    N: Notify<E>,
{
    RetryExecutorBuilder::new(backoff)
        .with_notify(notify)
        .with_max_attempts(max_attempts)
        .build()
        .execute(operation)
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use rebound_core::backoff::ExponentialBackoff;
/// use rebound_core::retry::{RetryExecutorBuilder, TracingNotify};
/// use std::num::NonZeroU32;
///
/// let executor = RetryExecutorBuilder::new(ExponentialBackoff::default())
///     .with_notify(TracingNotify::new("download"))
///     .with_max_attempts(NonZeroU32::new(5).unwrap())
///     .build();
/// ```
pub struct RetryExecutorBuilder<B, N = NoopNotify, S = ThreadSleeper> {
    backoff: B,
    notify: N,
    sleeper: S,
    max_attempts: Option<NonZeroU32>,
}

impl<B: Backoff> RetryExecutorBuilder<B> {
    /// Create a new builder around `backoff`, with no observer, no attempt
    /// cap and real thread sleeps
    pub fn new(backoff: B) -> Self {
        Self {
            backoff,
            notify: NoopNotify,
            sleeper: ThreadSleeper,
            max_attempts: None,
        }
    }
}

impl<B, N, S> RetryExecutorBuilder<B, N, S> {
    /// Set the observer
    pub fn with_notify<N2>(self, notify: N2) -> RetryExecutorBuilder<B, N2, S> {
        RetryExecutorBuilder {
            backoff: self.backoff,
            notify,
            sleeper: self.sleeper,
            max_attempts: self.max_attempts,
        }
    }

    /// Set the sleeper used between attempts
    pub fn with_sleeper<S2>(self, sleeper: S2) -> RetryExecutorBuilder<B, N, S2> {
        RetryExecutorBuilder {
            backoff: self.backoff,
            notify: self.notify,
            sleeper,
            max_attempts: self.max_attempts,
        }
    }

    /// Cap the number of attempts
    pub fn with_max_attempts(mut self, max_attempts: NonZeroU32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Build the executor
    pub fn build(self) -> RetryExecutor<B, N, S> {
        RetryExecutor {
            backoff: self.backoff,
            notify: self.notify,
            sleeper: self.sleeper,
            max_attempts: self.max_attempts,
        }
    }
}

/// A blocking retry loop with a backoff, an observer and an optional cap
///
/// Use `RetryExecutorBuilder` to create an instance. The executor owns its
/// backoff; pass `&mut backoff` to the builder to keep using the instance
/// after the executor is gone.
pub struct RetryExecutor<B, N = NoopNotify, S = ThreadSleeper> {
    backoff: B,
    notify: N,
    sleeper: S,
    max_attempts: Option<NonZeroU32>,
}

impl<B, N, S> RetryExecutor<B, N, S>
where
    B: Backoff,
    S: Sleeper,
{
    /// Run `operation` until it succeeds, the backoff stops or the attempt
    /// cap is reached
    ///
    /// The backoff and the observer are reset once, before the first
    /// attempt, on every call.
    ///
    /// # Returns
    ///
    /// The operation's success value, or the error from its last attempt.
    pub fn execute<F, T, E>(&mut self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        N: Notify<E>,
    {
        self.backoff.reset();
        self.notify.reset();
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);

            let err = match operation() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if let Some(max_attempts) = self.max_attempts {
                if attempt >= max_attempts.get() {
                    tracing::debug!(attempt, "attempt cap reached, giving up");
                    return Err(err);
                }
            }

            let Some(wait) = self.backoff.next_backoff() else {
                tracing::debug!(attempt, "backoff stopped, giving up");
                return Err(err);
            };

            self.notify.notify(&err, wait);
            self.sleeper.sleep(wait);
        }
    }

    /// Get the configured attempt cap
    pub fn max_attempts(&self) -> Option<NonZeroU32> {
        self.max_attempts
    }

    /// Get the observer
    pub fn notify(&self) -> &N {
        &self.notify
    }

    /// Recover the backoff, e.g. to inspect its state
    pub fn into_backoff(self) -> B {
        self.backoff
    }
}
