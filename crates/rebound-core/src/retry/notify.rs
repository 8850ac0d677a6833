//! Retry notification hooks
//!
//! This module provides the `Notify` trait, called once per failed attempt
//! that is about to be retried, and a `TracingNotify` implementation that
//! logs using the `tracing` crate.

use std::fmt::Display;
use std::time::Duration;

/// Observer for failed attempts that will be retried
///
/// `notify` runs synchronously on the retrying thread, after the backoff has
/// produced a wait and before the loop sleeps. It is never called for the
/// attempt that succeeds, nor for the attempt that ends the loop because the
/// backoff stopped or the attempt cap was reached.
///
/// Any closure `FnMut(&E, Duration)` is a `Notify<E>`. A panic raised by the
/// observer is not caught: it unwinds through the retry call and ends it.
///
/// To keep ownership of a stateful observer, lend it through a closure:
/// `|err: &E, wait| observer.notify(err, wait)`. Closures already cover
/// `&mut F`, so there is no separate `&mut N` impl.
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::Notify;
/// use std::time::Duration;
///
/// struct Counter {
///     retries: u32,
/// }
///
/// impl<E> Notify<E> for Counter {
///     fn notify(&mut self, _err: &E, _wait: Duration) {
///         self.retries += 1;
///     }
/// }
/// ```
pub trait Notify<E: ?Sized> {
    /// Called with the error that triggered this retry and the wait that follows
    fn notify(&mut self, err: &E, wait: Duration);

    /// Called once per retry call, before the first attempt
    ///
    /// Observers that number their notifications restart here, so a reused
    /// executor reports each call on its own.
    fn reset(&mut self) {}
}

impl<E: ?Sized, F> Notify<E> for F
where
    F: FnMut(&E, Duration),
{
    fn notify(&mut self, err: &E, wait: Duration) {
        self(err, wait)
    }
}

/// An observer that does nothing
///
/// Used by the loops that take no observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotify;

impl<E: ?Sized> Notify<E> for NoopNotify {
    fn notify(&mut self, _err: &E, _wait: Duration) {}
}

/// An observer that logs each retry at WARN level using `tracing`
///
/// # Example
///
/// ```rust
/// use rebound_core::retry::TracingNotify;
///
/// // Name the operation for better log context
/// let notify = TracingNotify::new("download");
/// assert_eq!(notify.operation(), "download");
/// ```
#[derive(Debug, Clone)]
pub struct TracingNotify {
    /// Name of the operation being retried (for log context)
    operation: String,
    retries: u32,
}

impl TracingNotify {
    /// Create a new tracing observer
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            retries: 0,
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Number of retries logged during the current retry call
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

impl Default for TracingNotify {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl<E: Display + ?Sized> Notify<E> for TracingNotify {
    fn notify(&mut self, err: &E, wait: Duration) {
        self.retries = self.retries.saturating_add(1);
        tracing::warn!(
            operation = %self.operation,
            retry = self.retries,
            error = %err,
            wait_ms = wait.as_millis() as u64,
            "attempt failed, will retry"
        );
    }

    fn reset(&mut self) {
        self.retries = 0;
    }
}
