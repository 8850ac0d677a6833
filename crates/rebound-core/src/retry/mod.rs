//! Retry loops driven by a pluggable backoff
//!
//! Every loop follows the same sequence: reset the backoff once, run the
//! operation, and after each failure ask the backoff for the next wait.
//! `None` from the backoff ends the loop with the error just observed;
//! otherwise the observer (if any) is notified and the loop waits before
//! trying again.
//!
//! # Features
//!
//! - Blocking loops: [`retry`], [`retry_notify`], [`retry_n`], [`retry_n_notify`]
//! - Async loops on tokio, including [`retry_notify_until`] with cancellation
//! - Observable retries via the [`Notify`] trait or any `FnMut(&E, Duration)`
//! - Built-in [`TracingNotify`] for logging
//! - Builder pattern for executor configuration
//!
//! Errors are never wrapped: the caller gets back exactly the error the
//! operation returned on its last attempt.
//!
//! # Example
//!
//! ```rust
//! use rebound_core::backoff::ExponentialBackoff;
//! use rebound_core::retry::{retry_notify, TracingNotify};
//! use std::time::Duration;
//!
//! let backoff = ExponentialBackoff::builder()
//!     .initial_interval(Duration::from_millis(1))
//!     .build();
//!
//! let mut attempts = 0;
//! let result: Result<u32, std::io::Error> = retry_notify(
//!     || {
//!         attempts += 1;
//!         if attempts < 2 {
//!             Err(std::io::Error::other("connection reset"))
//!         } else {
//!             Ok(attempts)
//!         }
//!     },
//!     backoff,
//!     TracingNotify::new("handshake"),
//! );
//! assert_eq!(result.unwrap(), 2);
//! ```

mod error;
mod executor;
mod future;
mod notify;
mod sleep;

pub use error::RetryError;
pub use executor::{
    retry, retry_n, retry_n_notify, retry_notify, RetryExecutor, RetryExecutorBuilder,
};
pub use future::{retry_async, retry_n_notify_async, retry_notify_async, retry_notify_until};
pub use notify::{NoopNotify, Notify, TracingNotify};
pub use sleep::{Sleeper, ThreadSleeper};

#[cfg(test)]
mod tests;
