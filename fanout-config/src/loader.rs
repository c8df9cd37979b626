//! Configuration loading from files and the environment

use std::path::Path;

use tracing::debug;

use crate::domains::dispatch::BackendKind;
use crate::domains::FanoutConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::validation::validate_config;

/// Environment variable overriding the backend selector
pub const ENV_BACKEND: &str = "FANOUT_BACKEND";
/// Environment variable overriding the scratch share directory
pub const ENV_SHARE_DIR: &str = "FANOUT_SHARE_DIR";

/// Loads and validates [`FanoutConfig`] from YAML with environment overrides
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(&self, path: impl AsRef<Path>) -> ConfigResult<FanoutConfig> {
        let content = std::fs::read_to_string(path.as_ref())?;
        self.from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(&self, content: &str) -> ConfigResult<FanoutConfig> {
        let mut config: FanoutConfig = serde_yaml::from_str(content)?;
        self.apply_env_overrides(&mut config)?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Build the default configuration, still honoring environment overrides
    pub fn from_env(&self) -> ConfigResult<FanoutConfig> {
        let mut config = FanoutConfig::default();
        self.apply_env_overrides(&mut config)?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env_overrides(&self, config: &mut FanoutConfig) -> ConfigResult<()> {
        if let Ok(value) = std::env::var(ENV_BACKEND) {
            config.dispatch.backend = parse_backend(&value)?;
            debug!(backend = ?config.dispatch.backend, "backend overridden from environment");
        }

        if let Ok(value) = std::env::var(ENV_SHARE_DIR) {
            if value.is_empty() {
                return Err(ConfigError::EnvError(format!(
                    "{} cannot be empty",
                    ENV_SHARE_DIR
                )));
            }
            config.dispatch.share_dir = value.into();
        }

        Ok(())
    }
}

fn parse_backend(value: &str) -> ConfigResult<BackendKind> {
    match value.to_ascii_lowercase().as_str() {
        "sequential" => Ok(BackendKind::Sequential),
        "pool" => Ok(BackendKind::Pool),
        "queue" => Ok(BackendKind::Queue),
        "scheduler" => Ok(BackendKind::Scheduler),
        other => Err(ConfigError::EnvError(format!(
            "{} has unknown backend '{}'",
            ENV_BACKEND, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_load_minimal_yaml() {
        let loader = ConfigLoader::new();
        let config = loader
            .from_yaml_str(
                r#"
dispatch:
  backend: pool
  poll_interval: 500
pool:
  workers: 4
"#,
            )
            .unwrap();

        assert_eq!(config.dispatch.backend, BackendKind::Pool);
        assert_eq!(config.dispatch.poll_interval, Duration::from_millis(500));
        assert_eq!(config.pool.workers, Some(4));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fanout.yaml");
        std::fs::write(&path, "dispatch:\n  backend: sequential\n").unwrap();

        let config = ConfigLoader::new().from_yaml_file(&path).unwrap();
        assert_eq!(config.dispatch.backend, BackendKind::Sequential);

        let missing = ConfigLoader::new().from_yaml_file(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(ConfigError::FileReadError(_))));
    }

    #[test]
    fn test_unknown_backend_is_fatal() {
        let loader = ConfigLoader::new();
        let result = loader.from_yaml_str(
            r#"
dispatch:
  backend: cloud
"#,
        );
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let loader = ConfigLoader::new();
        let result = loader.from_yaml_str(
            r#"
dispatch:
  poll_interval: 0
"#,
        );
        assert!(matches!(result, Err(ConfigError::DomainError { .. })));
    }

    #[test]
    fn test_scheduler_section_parses() {
        let loader = ConfigLoader::new();
        let config = loader
            .from_yaml_str(
                r#"
dispatch:
  backend: scheduler
scheduler:
  address: head-node.example.org
  max_tasks_per_submission: 16
"#,
            )
            .unwrap();

        let scheduler = config.scheduler.unwrap();
        assert_eq!(scheduler.address, "head-node.example.org");
        assert_eq!(scheduler.max_tasks_per_submission, 16);
        assert_eq!(scheduler.watchdog_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_parse_backend_names() {
        assert_eq!(parse_backend("Scheduler").unwrap(), BackendKind::Scheduler);
        assert!(parse_backend("mainframe").is_err());
    }
}
