//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a ratio in the half-open interval (0, 1]
pub fn validate_ratio(value: f64, field_name: &str, domain: &str) -> ConfigResult<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be in (0, 1], got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a complete configuration object
pub fn validate_config(config: &crate::domains::FanoutConfig) -> ConfigResult<()> {
    // Validate all domains that implement the Validatable trait
    config.dispatch.validate()?;
    config.pool.validate()?;

    // Validate optional domains
    if let Some(scheduler) = &config.scheduler {
        scheduler.validate()?;
    }

    if let Some(queue) = &config.queue {
        queue.validate()?;
    }

    Ok(())
}
