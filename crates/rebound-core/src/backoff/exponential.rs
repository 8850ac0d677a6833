//! Exponential backoff with randomized jitter and an elapsed-time cap

use super::Backoff;
use rand::Rng;
use std::time::{Duration, Instant};

const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_RANDOMIZATION_FACTOR: f64 = 0.5;
const DEFAULT_MULTIPLIER: f64 = 1.5;
const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_MAX_ELAPSED_TIME: Duration = Duration::from_secs(15 * 60);

/// Source of the current time for elapsed-time capping
pub trait Clock {
    /// The current instant
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Exponentially growing waits with randomized jitter
///
/// Each call to [`next_backoff`](Backoff::next_backoff) returns a value
/// drawn uniformly from the interval
///
/// ```text
/// [current * (1 - randomization_factor), current * (1 + randomization_factor)]
/// ```
///
/// and then grows `current` by `multiplier`, never past `max_interval`.
/// Once the time elapsed since the last [`reset`](Backoff::reset) plus the
/// next wait would exceed `max_elapsed_time`, the strategy stops.
///
/// # Defaults
///
/// | parameter              | value  |
/// |------------------------|--------|
/// | `initial_interval`     | 500ms  |
/// | `randomization_factor` | 0.5    |
/// | `multiplier`           | 1.5    |
/// | `max_interval`         | 60s    |
/// | `max_elapsed_time`     | 15min  |
///
/// # Example
///
/// ```rust
/// use rebound_core::backoff::{Backoff, ExponentialBackoff};
/// use std::time::Duration;
///
/// let mut backoff = ExponentialBackoff::builder()
///     .initial_interval(Duration::from_millis(100))
///     .multiplier(2.0)
///     .randomization_factor(0.0)
///     .build();
///
/// backoff.reset();
/// assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
/// assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialBackoff<C = SystemClock> {
    initial_interval: Duration,
    randomization_factor: f64,
    multiplier: f64,
    max_interval: Duration,
    max_elapsed_time: Option<Duration>,
    current_interval: Duration,
    start_time: Instant,
    clock: C,
}

impl ExponentialBackoff {
    /// Create an exponential backoff with the default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for configuring exponential backoff
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<C: Clock> ExponentialBackoff<C> {
    /// The un-randomized interval the next wait will be drawn around
    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Time elapsed since construction or the last reset
    pub fn elapsed_time(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.start_time)
    }

    /// The elapsed-time cap, if any
    pub fn max_elapsed_time(&self) -> Option<Duration> {
        self.max_elapsed_time
    }

    fn increment_current_interval(&mut self) {
        // Compare before multiplying so the interval can never overflow
        if self.current_interval.as_secs_f64() >= self.max_interval.as_secs_f64() / self.multiplier
        {
            self.current_interval = self.max_interval;
        } else {
            self.current_interval = self.current_interval.mul_f64(self.multiplier);
        }
    }
}

impl<C: Clock> Backoff for ExponentialBackoff<C> {
    fn reset(&mut self) {
        self.current_interval = self.initial_interval;
        self.start_time = self.clock.now();
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        let elapsed = self.elapsed_time();
        let next = randomized_interval(self.randomization_factor, self.current_interval);
        self.increment_current_interval();

        match self.max_elapsed_time {
            Some(max_elapsed) if elapsed.saturating_add(next) > max_elapsed => None,
            _ => Some(next),
        }
    }
}

/// Pick a random wait in `[current - factor * current, current + factor * current]`
fn randomized_interval(randomization_factor: f64, current: Duration) -> Duration {
    if randomization_factor == 0.0 || current.is_zero() {
        return current;
    }

    let current_secs = current.as_secs_f64();
    let delta = randomization_factor * current_secs;
    let low = current_secs - delta;
    let high = current_secs + delta;

    Duration::from_secs_f64(rand::rng().random_range(low..=high))
}

/// Builder for configuring `ExponentialBackoff`
///
/// Unset parameters fall back to the defaults listed on [`ExponentialBackoff`].
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder<C = SystemClock> {
    initial_interval: Option<Duration>,
    randomization_factor: Option<f64>,
    multiplier: Option<f64>,
    max_interval: Option<Duration>,
    max_elapsed_time: Option<Option<Duration>>,
    clock: C,
}

impl<C> ExponentialBackoffBuilder<C> {
    /// Set the first interval waited after a failure
    ///
    /// Default: 500ms
    pub fn initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = Some(interval);
        self
    }

    /// Set the randomization factor (clamped to 0.0..=1.0)
    ///
    /// A factor of 0.5 lets each wait vary by ±50% around the current interval.
    ///
    /// Default: 0.5
    pub fn randomization_factor(mut self, factor: f64) -> Self {
        let factor = if factor.is_nan() { 0.0 } else { factor };
        self.randomization_factor = Some(factor.clamp(0.0, 1.0));
        self
    }

    /// Set the growth multiplier (at least 1.0)
    ///
    /// Default: 1.5
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier.max(1.0));
        self
    }

    /// Set the ceiling for the un-randomized interval
    ///
    /// Default: 60s
    pub fn max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = Some(interval);
        self
    }

    /// Set the elapsed-time cap; `None` retries without a time limit
    ///
    /// Default: 15 minutes
    pub fn max_elapsed_time(mut self, max_elapsed_time: Option<Duration>) -> Self {
        self.max_elapsed_time = Some(max_elapsed_time);
        self
    }

    /// Use a different time source
    pub fn clock<C2: Clock>(self, clock: C2) -> ExponentialBackoffBuilder<C2> {
        ExponentialBackoffBuilder {
            initial_interval: self.initial_interval,
            randomization_factor: self.randomization_factor,
            multiplier: self.multiplier,
            max_interval: self.max_interval,
            max_elapsed_time: self.max_elapsed_time,
            clock,
        }
    }
}

impl<C: Clock> ExponentialBackoffBuilder<C> {
    /// Build the `ExponentialBackoff` instance
    pub fn build(self) -> ExponentialBackoff<C> {
        let initial_interval = self.initial_interval.unwrap_or(DEFAULT_INITIAL_INTERVAL);
        let start_time = self.clock.now();

        ExponentialBackoff {
            initial_interval,
            randomization_factor: self
                .randomization_factor
                .unwrap_or(DEFAULT_RANDOMIZATION_FACTOR),
            multiplier: self.multiplier.unwrap_or(DEFAULT_MULTIPLIER),
            max_interval: self.max_interval.unwrap_or(DEFAULT_MAX_INTERVAL),
            max_elapsed_time: self
                .max_elapsed_time
                .unwrap_or(Some(DEFAULT_MAX_ELAPSED_TIME)),
            current_interval: initial_interval,
            start_time,
            clock: self.clock,
        }
    }
}
