//! Experiment configuration
//!
//! TOML-backed configuration for the harness: where the registry and query
//! fixtures live, how to reach the completion service, and how a run is
//! shaped (runs, query count, concurrency, timeouts).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level experiment configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub registry: RegistrySection,
    pub service: ServiceSection,
    #[serde(default)]
    pub run: RunSection,
}

/// Paths to the registry and query fixture files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrySection {
    /// Domain registry file (TOML)
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
    /// Query fixture file (TOML)
    #[serde(default = "default_queries_path")]
    pub queries_path: PathBuf,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
            queries_path: default_queries_path(),
        }
    }
}

/// Completion service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSection {
    /// Model identifier
    pub model: String,
    /// Environment variable containing the API key
    pub api_key_env: String,
    /// Base URL override, mainly for tests
    pub base_url: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum delegation depth before a dispatch is cut off
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Run shape: how many runs, how many queries, how wide
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSection {
    /// Number of repeated runs per topology
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Number of query fixtures to use (prefix of the fixture file)
    #[serde(default = "default_queries")]
    pub queries: usize,
    /// Concurrent in-flight queries; 1 means strictly sequential
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-query timeout in seconds
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    /// CSV output path; a timestamped name is generated when absent
    pub output: Option<PathBuf>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            queries: default_queries(),
            concurrency: default_concurrency(),
            query_timeout_secs: default_query_timeout_secs(),
            output: None,
        }
    }
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("registry.toml")
}

fn default_queries_path() -> PathBuf {
    PathBuf::from("queries.toml")
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_depth() -> usize {
    4
}

fn default_runs() -> usize {
    1
}

fn default_queries() -> usize {
    10
}

fn default_concurrency() -> usize {
    1
}

fn default_query_timeout_secs() -> u64 {
    120
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ExperimentConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ExperimentConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.model.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "[service] model must not be empty".to_string(),
            ));
        }
        if self.run.runs == 0 {
            return Err(ConfigError::InvalidConfig(
                "[run] runs must be at least 1".to_string(),
            ));
        }
        if self.run.queries == 0 {
            return Err(ConfigError::InvalidConfig(
                "[run] queries must be at least 1".to_string(),
            ));
        }
        if self.run.concurrency == 0 {
            return Err(ConfigError::InvalidConfig(
                "[run] concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the completion service API key from the configured environment variable
    pub fn service_api_key(&self) -> Result<String, ConfigError> {
        std::env::var(&self.service.api_key_env)
            .map_err(|_| ConfigError::EnvVarNotFound(self.service.api_key_env.clone()))
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[service]
model = "gemini-2.5-flash"
api_key_env = "GEMINI_API_KEY"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}
