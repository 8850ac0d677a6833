//! Stateless strategies

use super::Backoff;
use std::time::Duration;

/// Retries immediately, without ever stopping
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroBackoff;

impl Backoff for ZeroBackoff {
    fn reset(&mut self) {}

    fn next_backoff(&mut self) -> Option<Duration> {
        Some(Duration::ZERO)
    }
}

/// Never retries: the operation runs exactly once
#[derive(Debug, Clone, Copy, Default)]
pub struct StopBackoff;

impl Backoff for StopBackoff {
    fn reset(&mut self) {}

    fn next_backoff(&mut self) -> Option<Duration> {
        None
    }
}

/// Waits the same interval between every attempt
///
/// # Example
///
/// ```rust
/// use rebound_core::backoff::{Backoff, ConstantBackoff};
/// use std::time::Duration;
///
/// let mut backoff = ConstantBackoff::new(Duration::from_millis(250));
/// assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(250)));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConstantBackoff {
    interval: Duration,
}

impl ConstantBackoff {
    /// Create a constant backoff with the given interval
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Get the configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Backoff for ConstantBackoff {
    fn reset(&mut self) {}

    fn next_backoff(&mut self) -> Option<Duration> {
        Some(self.interval)
    }
}
