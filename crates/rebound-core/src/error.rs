//! Error types for rebound-core

use thiserror::Error;

/// Result type alias using rebound-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or validating retry configuration
///
/// Retry loops themselves never produce this type: they hand back the
/// operation's own error untouched.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration values
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable override could not be parsed
    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid environment variable error
    pub fn invalid_env_var(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            value: value.into(),
        }
    }
}
