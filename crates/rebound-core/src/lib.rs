//! # rebound-core
//!
//! Retry loops for fallible operations, decoupled from the waiting policy:
//! - Blocking and async retry loops with optional attempt caps
//! - The `Backoff` contract plus constant, exponential and capped strategies
//! - Per-retry notifications, with a `tracing`-backed observer
//! - Serializable retry policies loaded from YAML and environment variables
//!
//! ```rust
//! use rebound_core::backoff::ConstantBackoff;
//! use rebound_core::retry::retry_n;
//! use std::num::NonZeroU32;
//! use std::time::Duration;
//!
//! let mut attempts = 0;
//! let result: Result<(), &str> = retry_n(
//!     NonZeroU32::new(3).unwrap(),
//!     ConstantBackoff::new(Duration::from_millis(1)),
//!     || {
//!         attempts += 1;
//!         Err("resource busy")
//!     },
//! );
//!
//! assert_eq!(result, Err("resource busy"));
//! assert_eq!(attempts, 3);
//! ```

pub mod backoff;
pub mod config;
pub mod error;
pub mod retry;

pub use backoff::Backoff;
pub use config::{ConfigLoader, RetryPoliciesConfig, RetryPolicy};
pub use error::{Error, Result};
pub use retry::{retry, retry_n, retry_n_notify, retry_notify, Notify, RetryError};
