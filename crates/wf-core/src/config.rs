//! Configuration types and parsing for weft.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main engine configuration from weft.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project workspace name
    pub name: String,

    /// Path to the warehouse database file (`:memory:` for in-memory)
    #[serde(default = "default_warehouse_path")]
    pub warehouse_path: String,

    /// Directory holding project state and run history
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Text-analytics tuning
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Optional per-node timeout in seconds, enforced by the orchestrator.
    /// No timeout when absent.
    #[serde(default)]
    pub node_timeout_secs: Option<u64>,
}

/// Batch and retry tuning for the text-analytics evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Rows per completion-service call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Attempts per batch, including the first
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Initial backoff delay in seconds
    #[serde(default = "default_retry_base_secs")]
    pub retry_base_secs: u64,

    /// Backoff ceiling in seconds
    #[serde(default = "default_retry_max_secs")]
    pub retry_max_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            retry_attempts: default_retry_attempts(),
            retry_base_secs: default_retry_base_secs(),
            retry_max_secs: default_retry_max_secs(),
        }
    }
}

impl AnalyticsConfig {
    pub fn retry_base(&self) -> Duration {
        Duration::from_secs(self.retry_base_secs)
    }

    pub fn retry_max(&self) -> Duration {
        Duration::from_secs(self.retry_max_secs)
    }
}

fn default_warehouse_path() -> String {
    "weft.duckdb".to_string()
}

fn default_state_path() -> String {
    ".weft".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_retry_attempts() -> u32 {
    4
}

fn default_retry_base_secs() -> u64 {
    2
}

fn default_retry_max_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from a weft.yml file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| CoreError::IoWithPath {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;
        Ok(config)
    }

    /// Configuration with defaults for every tunable, for embedding and tests.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            warehouse_path: default_warehouse_path(),
            state_path: default_state_path(),
            analytics: AnalyticsConfig::default(),
            node_timeout_secs: None,
        }
    }

    pub fn node_timeout(&self) -> Option<Duration> {
        self.node_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_yaml::from_str("name: demo").unwrap();
        assert_eq!(config.warehouse_path, "weft.duckdb");
        assert_eq!(config.state_path, ".weft");
        assert_eq!(config.analytics.batch_size, 100);
        assert_eq!(config.analytics.retry_attempts, 4);
        assert!(config.node_timeout().is_none());
    }

    #[test]
    fn test_overrides() {
        let yaml = r#"
name: demo
warehouse_path: ":memory:"
analytics:
  batch_size: 25
  retry_attempts: 2
node_timeout_secs: 30
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.warehouse_path, ":memory:");
        assert_eq!(config.analytics.batch_size, 25);
        assert_eq!(config.node_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str("name: demo\nbogus: 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/weft.yml")).unwrap_err();
        assert!(matches!(err, CoreError::ConfigNotFound { .. }));
    }
}
