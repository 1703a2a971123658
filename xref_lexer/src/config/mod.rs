//! Configuration module for the xref backend
//!
//! Security limits live in [`constants::compile_time`] and cannot be changed
//! at runtime. User preferences come from the environment and an optional
//! TOML file, and are gathered into one [`XrefConfig`] value at process start.

pub mod constants;
pub mod runtime;

pub use constants::compile_time;
pub use runtime::{env_vars, LogBackend, LogLevel, LoggingPreferences, ToolPreferences};

use crate::logging::codes::{self, Code};
use compile_time::tools::MAX_TOOL_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Root repository location is not configured (set {})", env_vars::REPO_DIR)]
    MissingRepoDir,

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Cannot load config file {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },
}

impl ConfigError {
    pub fn error_code(&self) -> Code {
        match self {
            ConfigError::MissingRepoDir => codes::config::MISSING_REPO_DIR,
            ConfigError::InvalidValue { .. } => codes::config::INVALID_VALUE,
            ConfigError::ConfigFile { .. } => codes::config::CONFIG_FILE_ERROR,
        }
    }
}

/// Shape of the optional TOML file; every key may be omitted
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    repo_dir: Option<PathBuf>,
    tools: ToolPreferences,
    logging: LoggingPreferences,
}

/// Process-wide configuration, read once and passed down explicitly
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XrefConfig {
    pub repo_dir: PathBuf,
    pub tools: ToolPreferences,
    pub logging: LoggingPreferences,
}

impl XrefConfig {
    /// Configuration for `repo_dir` with environment-derived preferences
    pub fn new<P: Into<PathBuf>>(repo_dir: P) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            tools: ToolPreferences::default(),
            logging: LoggingPreferences::default(),
        }
    }

    /// Read `LXR_REPO_DIR` and, when `XREF_CONFIG` names one, the TOML file
    pub fn from_env() -> Result<Self, ConfigError> {
        let repo_dir = std::env::var_os(env_vars::REPO_DIR).map(PathBuf::from);
        let config_file = std::env::var_os(env_vars::CONFIG_FILE).map(PathBuf::from);
        Self::from_sources(repo_dir, config_file.as_deref())
    }

    /// Build from explicit sources. Keys present in the file override the
    /// environment; the repository location may come from either.
    pub fn from_sources(
        repo_dir: Option<PathBuf>,
        config_file: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => load_config_file(path)?,
            None => ConfigFile::default(),
        };

        let repo_dir = file
            .repo_dir
            .or(repo_dir)
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or(ConfigError::MissingRepoDir)?;

        let config = Self {
            repo_dir,
            tools: file.tools,
            logging: file.logging,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_timeout("tools.timeout_secs", self.tools.timeout_secs)?;
        check_timeout("tools.fetch_timeout_secs", self.tools.fetch_timeout_secs)?;

        if self.tools.search_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "tools.search_path".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn check_timeout(key: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 || secs > MAX_TOOL_TIMEOUT_SECS {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("{} is outside 1..={}", secs, MAX_TOOL_TIMEOUT_SECS),
        });
    }
    Ok(())
}

fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    toml::from_str(&text).map_err(|e| ConfigError::ConfigFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
