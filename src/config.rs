//! Configuration System
//!
//! Hierarchical configuration loading from:
//! - config.toml (default configuration)
//! - config.local.toml (git-ignored local overrides)
//! - Environment variables (`ROWSOURCE_*` prefix)
//!
//! ## Example
//!
//! ```toml
//! # config.toml
//! [comparison]
//! order_sensitive = false
//! blank_node_strategy = "match-any"
//! max_differences = 100
//!
//! [execution]
//! max_materialized_rows = 1000000
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! ROWSOURCE_COMPARISON__ORDER_SENSITIVE=true
//! ROWSOURCE_EXECUTION__MAX_MATERIALIZED_ROWS=50000
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub execution: ExecutionLimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default comparison-engine behavior (spec §4.9), overridable per
/// invocation by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default)]
    pub order_sensitive: bool,

    #[serde(default = "default_blank_node_strategy")]
    pub blank_node_strategy: String,

    #[serde(default = "default_max_differences")]
    pub max_differences: usize,

    #[serde(default = "default_signature_threshold")]
    pub signature_threshold: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ComparisonConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Resource limits applied while operators materialize rows (GroupBy's
/// full drain, Join's nested-loop right-side buffer, Union's `read_all`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLimitsConfig {
    #[serde(default = "default_max_rows")]
    pub max_materialized_rows: usize,

    #[serde(default = "default_max_memory_bytes")]
    pub max_memory_bytes: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_blank_node_strategy() -> String {
    "match-any".to_string()
}
fn default_max_differences() -> usize {
    100
}
fn default_signature_threshold() -> usize {
    1000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_rows() -> usize {
    1_000_000
}
fn default_max_memory_bytes() -> usize {
    512 * 1024 * 1024
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        ComparisonConfig {
            order_sensitive: false,
            blank_node_strategy: default_blank_node_strategy(),
            max_differences: default_max_differences(),
            signature_threshold: default_signature_threshold(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ExecutionLimitsConfig {
    fn default() -> Self {
        ExecutionLimitsConfig {
            max_materialized_rows: default_max_rows(),
            max_memory_bytes: default_max_memory_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            comparison: ComparisonConfig::default(),
            execution: ExecutionLimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// Merges in order: `config.toml`, `config.local.toml`, then
    /// `ROWSOURCE_*` environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Self::default_provider())
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("ROWSOURCE_").split("__"))
            .extract()
    }

    /// Load configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::from(Self::default_provider())
            .merge(Toml::file(path))
            .merge(Env::prefixed("ROWSOURCE_").split("__"))
            .extract()
    }

    fn default_provider() -> figment::providers::Serialized<Config> {
        figment::providers::Serialized::defaults(Config::default())
    }
}
