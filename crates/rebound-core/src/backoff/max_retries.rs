//! Retry-count cap for any strategy

use super::Backoff;
use std::time::Duration;

/// Wraps a strategy and stops after `max_retries` waits have been handed out
///
/// Unlike the attempt cap on [`retry_n`](crate::retry::retry_n), this lives
/// inside the strategy, so it composes with any loop.
///
/// # Example
///
/// ```rust
/// use rebound_core::backoff::{Backoff, WithMaxRetries, ZeroBackoff};
/// use std::time::Duration;
///
/// let mut backoff = WithMaxRetries::new(ZeroBackoff, 2);
/// backoff.reset();
/// assert_eq!(backoff.next_backoff(), Some(Duration::ZERO));
/// assert_eq!(backoff.next_backoff(), Some(Duration::ZERO));
/// assert_eq!(backoff.next_backoff(), None);
/// ```
#[derive(Debug, Clone)]
pub struct WithMaxRetries<B> {
    inner: B,
    max_retries: u32,
    retries: u32,
}

impl<B> WithMaxRetries<B> {
    /// Wrap `inner`, allowing at most `max_retries` retries
    pub fn new(inner: B, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            retries: 0,
        }
    }

    /// Get the configured retry limit
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Unwrap the inner strategy
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: Backoff> Backoff for WithMaxRetries<B> {
    fn reset(&mut self) {
        self.retries = 0;
        self.inner.reset();
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }
        self.retries += 1;
        self.inner.next_backoff()
    }
}
