//! Retry configuration loading
//!
//! Loads policies with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. YAML file
//! 3. Environment variables (REBOUND_* prefix), applied to the default policy

use super::{BackoffKind, RetryPoliciesConfig};
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use std::str::FromStr;

const ENV_MAX_ATTEMPTS: &str = "REBOUND_MAX_ATTEMPTS";
const ENV_STRATEGY: &str = "REBOUND_STRATEGY";
const ENV_INITIAL_INTERVAL_MS: &str = "REBOUND_INITIAL_INTERVAL_MS";
const ENV_MAX_INTERVAL_MS: &str = "REBOUND_MAX_INTERVAL_MS";
const ENV_MAX_ELAPSED_MS: &str = "REBOUND_MAX_ELAPSED_MS";

/// Loads retry policies from a YAML file plus environment overrides
pub struct ConfigLoader {
    path: Utf8PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given config file
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the config file
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Load policies, using defaults when the file does not exist
    pub fn load(&self) -> Result<RetryPoliciesConfig> {
        let config = if self.path.exists() {
            Self::load_yaml_file(&self.path)?
        } else {
            tracing::debug!(path = %self.path, "no retry config file, using defaults");
            RetryPoliciesConfig::default()
        };

        let config = Self::apply_env_overrides(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load policies, failing when the file does not exist
    pub fn load_required(&self) -> Result<RetryPoliciesConfig> {
        if !self.path.exists() {
            return Err(Error::config_not_found(self.path.as_str()));
        }
        self.load()
    }

    /// Parse policies from a YAML string, without environment overrides
    pub fn from_yaml_str(content: &str) -> Result<RetryPoliciesConfig> {
        let config: RetryPoliciesConfig = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<RetryPoliciesConfig> {
        tracing::debug!(path = %path, "loading retry config");
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    fn apply_env_overrides(mut config: RetryPoliciesConfig) -> Result<RetryPoliciesConfig> {
        let policy = &mut config.default;

        if let Some(val) = parse_env::<u32>(ENV_MAX_ATTEMPTS)? {
            policy.max_attempts = Some(val);
        }

        if let Some(val) = parse_env::<BackoffKind>(ENV_STRATEGY)? {
            policy.strategy = val;
        }

        if let Some(val) = parse_env::<u64>(ENV_INITIAL_INTERVAL_MS)? {
            policy.initial_interval_ms = val;
        }

        if let Some(val) = parse_env::<u64>(ENV_MAX_INTERVAL_MS)? {
            policy.max_interval_ms = val;
        }

        if let Some(val) = parse_env::<u64>(ENV_MAX_ELAPSED_MS)? {
            policy.max_elapsed_ms = val;
        }

        Ok(config)
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_env_var(name, val)),
        Err(_) => Ok(None),
    }
}
