//! Workspace configuration loaded from `insights.toml`.
//!
//! Every field has a default, so a missing config file yields the stock
//! layout: `data/celo_balances.{json,csv}` and `data/stablecoin_cusd.csv`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "insights.toml";

/// Errors from config loading and parameter parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing credential: set {0} in the environment or .env")]
    MissingCredential(String),

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("invalid query parameter '{0}' (expected key=value)")]
    InvalidParam(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    pub paths: PathsConfig,
    pub fetch: FetchConfig,
    pub report: ReportConfig,
}

/// Artifact locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// JSON query result consumed by the converter.
    pub balances_json: PathBuf,
    /// CSV produced by the converter and read by the reporter.
    pub balances_csv: PathBuf,
    /// Raw CSV dump written by the fetcher.
    pub fetch_output: PathBuf,
    /// Directory for CSV downloads and TUI logs.
    pub export_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            balances_json: PathBuf::from("data/celo_balances.json"),
            balances_csv: PathBuf::from("data/celo_balances.csv"),
            fetch_output: PathBuf::from("data/stablecoin_cusd.csv"),
            export_dir: PathBuf::from("exports"),
        }
    }
}

/// Remote query settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub query_id: u64,
    pub query_name: String,
    /// Seconds between execution status polls.
    pub poll_interval_secs: u64,
    /// Query parameters forwarded as `query_parameters`.
    pub params: BTreeMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            query_id: 5_354_328,
            query_name: "Any Name".to_string(),
            poll_interval_secs: 5,
            params: BTreeMap::new(),
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub subtitle: String,
    pub token_symbol: String,
    pub top_n: usize,
    pub data_source: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Celo Ecosystem Insights".to_string(),
            subtitle: "Track current cUSD balances on the Celo blockchain".to_string(),
            token_symbol: "cUSD".to_string(),
            top_n: 20,
            data_source: "Dune Analytics".to_string(),
        }
    }
}

impl InsightsConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, or `insights.toml` if present, or defaults.
    ///
    /// An explicit path that does not exist is an error; the implicit file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.exists() {
                    Self::from_file(implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.report.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                name: "report.top_n".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.fetch.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "fetch.poll_interval_secs".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Parse `key=value` pairs into a parameter map.
pub fn parse_params<S: AsRef<str>>(pairs: &[S]) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut params = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidParam(pair.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::InvalidParam(pair.to_string()));
        }
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}
