//! Retry policy configuration
//!
//! Policies describe a backoff strategy and an optional attempt cap in a
//! serializable form, so retry behavior can live in YAML next to the rest of
//! an application's configuration.

mod loader;

pub use loader::ConfigLoader;

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::{
    Backoff, ConstantBackoff, ExponentialBackoff, StopBackoff, WithMaxRetries, ZeroBackoff,
};
use crate::error::{Error, Result};
use crate::retry::RetryExecutorBuilder;

/// A backoff strategy built from configuration
pub type DynBackoff = Box<dyn Backoff + Send>;

/// Retry policy configurations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Default retry policy
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl RetryPoliciesConfig {
    /// Policy for a named operation, falling back to the default policy
    pub fn policy_for(&self, operation: &str) -> &RetryPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }

    /// Validate the default policy and every per-operation policy
    pub fn validate(&self) -> Result<()> {
        self.default
            .validate()
            .map_err(|e| Error::invalid_config(format!("default: {}", e)))?;

        for (name, policy) in &self.operations {
            policy
                .validate()
                .map_err(|e| Error::invalid_config(format!("operations.{}: {}", name, e)))?;
        }

        Ok(())
    }
}

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of attempts; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Backoff strategy
    #[serde(default)]
    pub strategy: BackoffKind,

    /// First wait in milliseconds (the fixed wait for `constant`)
    #[serde(default = "default_initial_interval")]
    pub initial_interval_ms: u64,

    /// Ceiling for exponential growth in milliseconds
    #[serde(default = "default_max_interval")]
    pub max_interval_ms: u64,

    /// Elapsed-time cap for exponential backoff in milliseconds; 0 disables it
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_ms: u64,

    /// Growth multiplier for exponential backoff
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Jitter factor for exponential backoff, between 0.0 and 1.0
    #[serde(default = "default_randomization_factor")]
    pub randomization_factor: f64,

    /// Stop after this many retries, whatever the strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            strategy: BackoffKind::default(),
            initial_interval_ms: default_initial_interval(),
            max_interval_ms: default_max_interval(),
            max_elapsed_ms: default_max_elapsed(),
            multiplier: default_multiplier(),
            randomization_factor: default_randomization_factor(),
            max_retries: None,
        }
    }
}

fn default_initial_interval() -> u64 {
    500
}
fn default_max_interval() -> u64 {
    60_000
}
fn default_max_elapsed() -> u64 {
    900_000
}
fn default_multiplier() -> f64 {
    1.5
}
fn default_randomization_factor() -> f64 {
    0.5
}

impl RetryPolicy {
    /// Check the policy for values no strategy can honor
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == Some(0) {
            return Err(Error::invalid_config("max-attempts must be at least 1"));
        }

        if self.strategy == BackoffKind::Exponential {
            if !self.multiplier.is_finite() || self.multiplier < 1.0 {
                return Err(Error::invalid_config(format!(
                    "multiplier must be a finite number >= 1.0, got {}",
                    self.multiplier
                )));
            }

            if !(0.0..=1.0).contains(&self.randomization_factor) {
                return Err(Error::invalid_config(format!(
                    "randomization-factor must be between 0.0 and 1.0, got {}",
                    self.randomization_factor
                )));
            }

            if self.max_interval_ms < self.initial_interval_ms {
                return Err(Error::invalid_config(format!(
                    "max-interval-ms ({}) is below initial-interval-ms ({})",
                    self.max_interval_ms, self.initial_interval_ms
                )));
            }
        }

        Ok(())
    }

    /// The attempt cap, if any
    pub fn max_attempts(&self) -> Result<Option<NonZeroU32>> {
        match self.max_attempts {
            None => Ok(None),
            Some(n) => NonZeroU32::new(n)
                .map(Some)
                .ok_or_else(|| Error::invalid_config("max-attempts must be at least 1")),
        }
    }

    /// Build the backoff strategy this policy describes
    pub fn build_backoff(&self) -> Result<DynBackoff> {
        self.validate()?;

        let initial = Duration::from_millis(self.initial_interval_ms);
        let backoff: DynBackoff = match self.strategy {
            BackoffKind::Zero => Box::new(ZeroBackoff),
            BackoffKind::Stop => Box::new(StopBackoff),
            BackoffKind::Constant => Box::new(ConstantBackoff::new(initial)),
            BackoffKind::Exponential => Box::new(
                ExponentialBackoff::builder()
                    .initial_interval(initial)
                    .max_interval(Duration::from_millis(self.max_interval_ms))
                    .max_elapsed_time(
                        (self.max_elapsed_ms > 0)
                            .then(|| Duration::from_millis(self.max_elapsed_ms)),
                    )
                    .multiplier(self.multiplier)
                    .randomization_factor(self.randomization_factor)
                    .build(),
            ),
        };

        Ok(match self.max_retries {
            Some(max_retries) => Box::new(WithMaxRetries::new(backoff, max_retries)),
            None => backoff,
        })
    }

    /// An executor builder preloaded with this policy's backoff and cap
    ///
    /// # Example
    ///
    /// ```rust
    /// use rebound_core::config::RetryPolicy;
    /// use rebound_core::retry::TracingNotify;
    ///
    /// # fn main() -> rebound_core::Result<()> {
    /// let policy = RetryPolicy {
    ///     max_attempts: Some(3),
    ///     initial_interval_ms: 1,
    ///     ..RetryPolicy::default()
    /// };
    ///
    /// let result: Result<(), std::io::Error> = policy
    ///     .executor_builder()?
    ///     .with_notify(TracingNotify::new("sync"))
    ///     .build()
    ///     .execute(|| Err(std::io::Error::other("offline")));
    /// assert!(result.is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn executor_builder(&self) -> Result<RetryExecutorBuilder<DynBackoff>> {
        let builder = RetryExecutorBuilder::new(self.build_backoff()?);
        Ok(match self.max_attempts()? {
            Some(max_attempts) => builder.with_max_attempts(max_attempts),
            None => builder,
        })
    }
}

/// Backoff strategy kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffKind {
    /// Retry immediately
    Zero,

    /// Never retry
    Stop,

    /// Fixed delay between retries
    Constant,

    /// Exponential backoff with jitter (default)
    #[default]
    Exponential,
}

impl FromStr for BackoffKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(Self::Zero),
            "stop" => Ok(Self::Stop),
            "constant" => Ok(Self::Constant),
            "exponential" => Ok(Self::Exponential),
            other => Err(Error::invalid_config(format!(
                "unknown strategy '{}', expected zero, stop, constant or exponential",
                other
            ))),
        }
    }
}

impl fmt::Display for BackoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zero => "zero",
            Self::Stop => "stop",
            Self::Constant => "constant",
            Self::Exponential => "exponential",
        };
        f.write_str(name)
    }
}
