///
/// # Driver Configuration
///
/// Registry capacities and fetch sizing, read from a TOML file with optional
/// environment overrides. Every key is optional and falls back to the
/// defaults below.
///
/// ## Example hostdbi.toml
///
/// ```toml
/// driver_name = "hostdbi"
///
/// [limits]
/// max_connections = 16
/// max_statements = 16
/// max_result_sets = 16
///
/// [fetch]
/// default_batch = 500
/// trim_trailing_blanks = false
/// ```
///
/// ## Environment
///
/// `HOSTDBI_MAX_CONNECTIONS`, `HOSTDBI_MAX_STATEMENTS`,
/// `HOSTDBI_MAX_RESULT_SETS` and `HOSTDBI_FETCH_DEFAULT_BATCH` override the
/// matching keys. Zero and unparsable values are ignored.
///

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::DbiError;

pub const DEFAULT_TABLE_CAPACITY: usize = 16;
pub const DEFAULT_FETCH_BATCH: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DbiConfig {
    pub driver_name: String,
    pub limits: Limits,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Limits {
    pub max_connections: usize,
    pub max_statements: usize,
    pub max_result_sets: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub default_batch: usize,
    pub trim_trailing_blanks: bool,
}

impl Default for DbiConfig {
    fn default() -> Self {
        Self {
            driver_name: "hostdbi".to_string(),
            limits: Limits::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_TABLE_CAPACITY,
            max_statements: DEFAULT_TABLE_CAPACITY,
            max_result_sets: DEFAULT_TABLE_CAPACITY,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_batch: DEFAULT_FETCH_BATCH,
            trim_trailing_blanks: false,
        }
    }
}

pub fn load_config(path: &Path) -> Result<DbiConfig, DbiError> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| DbiError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn parse_config_str(content: &str) -> Result<DbiConfig, DbiError> {
    toml::from_str(content).map_err(|e| DbiError::Config {
        path: PathBuf::from("<inline>"),
        reason: e.to_string(),
    })
}

fn nonzero(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<usize> {
    lookup(name)
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&v| v != 0)
}

impl DbiConfig {
    /// Defaults with process environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_with(|name| std::env::var(name).ok());
        config
    }

    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = nonzero(&lookup, "HOSTDBI_MAX_CONNECTIONS") {
            self.limits.max_connections = v;
        }
        if let Some(v) = nonzero(&lookup, "HOSTDBI_MAX_STATEMENTS") {
            self.limits.max_statements = v;
        }
        if let Some(v) = nonzero(&lookup, "HOSTDBI_MAX_RESULT_SETS") {
            self.limits.max_result_sets = v;
        }
        if let Some(v) = nonzero(&lookup, "HOSTDBI_FETCH_DEFAULT_BATCH") {
            self.fetch.default_batch = v;
        }
    }
}
