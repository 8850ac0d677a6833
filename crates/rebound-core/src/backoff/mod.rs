//! Backoff strategies
//!
//! A [`Backoff`] is a stateful cursor over a sequence of wait durations.
//! The retry loops only ever call [`Backoff::reset`] once per call and
//! [`Backoff::next_backoff`] after each failed attempt; how the sequence
//! grows is entirely up to the implementation.
//!
//! # Strategies
//!
//! - [`ZeroBackoff`] - retry immediately, forever
//! - [`StopBackoff`] - never retry
//! - [`ConstantBackoff`] - fixed wait between attempts
//! - [`ExponentialBackoff`] - growing, randomized waits with an optional elapsed-time cap
//! - [`WithMaxRetries`] - caps the number of waits handed out by another strategy

mod constant;
mod exponential;
mod max_retries;

pub use constant::{ConstantBackoff, StopBackoff, ZeroBackoff};
pub use exponential::{Clock, ExponentialBackoff, ExponentialBackoffBuilder, SystemClock};
pub use max_retries::WithMaxRetries;

use std::time::Duration;

/// The capability set every backoff strategy exposes to the retry loops
///
/// Both methods take `&mut self`: a strategy is exclusively borrowed by one
/// retry call at a time, so sharing a single instance between two concurrent
/// calls does not compile.
///
/// # Example
///
/// ```rust
/// use rebound_core::backoff::Backoff;
/// use std::time::Duration;
///
/// /// Waits 10ms, 20ms, 30ms and then gives up
/// struct Linear {
///     step: u32,
/// }
///
/// impl Backoff for Linear {
///     fn reset(&mut self) {
///         self.step = 0;
///     }
///
///     fn next_backoff(&mut self) -> Option<Duration> {
///         self.step += 1;
///         (self.step <= 3).then(|| Duration::from_millis(10) * self.step)
///     }
/// }
/// ```
pub trait Backoff {
    /// Reinitialize the cursor to the strategy's starting state
    fn reset(&mut self);

    /// Advance the cursor
    ///
    /// # Returns
    ///
    /// - `Some(Duration)`: wait this long before the next attempt
    /// - `None`: stop, no further attempts should be made
    fn next_backoff(&mut self) -> Option<Duration>;
}

impl<B: Backoff + ?Sized> Backoff for &mut B {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        (**self).next_backoff()
    }
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        (**self).next_backoff()
    }
}
