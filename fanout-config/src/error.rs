//! Configuration error types

use thiserror::Error;

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating a configuration
///
/// Every variant is fatal before dispatch: a run never starts on a
/// configuration that failed to load or validate.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    /// YAML parsing failure, including unknown backend selectors
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Environment override was present but unusable
    #[error("Environment variable error: {0}")]
    EnvError(String),

    /// A domain section failed validation
    #[error("Invalid {domain} configuration: {message}")]
    DomainError { domain: String, message: String },
}
