// RUNTIME PREFERENCES (User Experience)

use super::constants::compile_time::tools::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_TOOL_PATH, DEFAULT_TOOL_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPreferences {
    /// Timeout for read-only queries (ls-tree, cat-file, ctags)
    pub timeout_secs: u64,

    /// Timeout for `update fetch`, which talks to remotes
    pub fetch_timeout_secs: u64,

    /// PATH handed to child processes; the parent environment is not inherited
    pub search_path: String,
}

impl Default for ToolPreferences {
    fn default() -> Self {
        Self {
            timeout_secs: env::var(env_vars::TOOL_TIMEOUT_SECS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
            fetch_timeout_secs: env::var(env_vars::FETCH_TIMEOUT_SECS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            search_path: env::var(env_vars::TOOL_PATH)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_TOOL_PATH.to_string()),
        }
    }
}

/// Where log events are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogBackend {
    /// Events are rendered directly to stderr
    Console,
    /// Events are forwarded to the `log` facade (env_logger in the CLI)
    Facade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Minimum level emitted; stdout is reserved for query results so the
    /// default stays quiet
    pub min_log_level: LogLevel,

    pub backend: LogBackend,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::STRUCTURED_LOGGING)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOG_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Warning),
            backend: env::var(env_vars::LOG_BACKEND)
                .ok()
                .and_then(|v| parse_log_backend(&v))
                .unwrap_or(LogBackend::Console),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel for compatibility
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

fn parse_log_backend(backend: &str) -> Option<LogBackend> {
    match backend.to_lowercase().as_str() {
        "console" | "stderr" => Some(LogBackend::Console),
        "facade" | "log" => Some(LogBackend::Facade),
        _ => None,
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Repository
    pub const REPO_DIR: &str = "LXR_REPO_DIR";
    /// Site variables handed through to external tools
    pub const SITE_PREFIX: &str = "LXR_";
    pub const CONFIG_FILE: &str = "XREF_CONFIG";

    // Tools
    pub const TOOL_TIMEOUT_SECS: &str = "XREF_TOOL_TIMEOUT_SECS";
    pub const FETCH_TIMEOUT_SECS: &str = "XREF_FETCH_TIMEOUT_SECS";
    pub const TOOL_PATH: &str = "XREF_TOOL_PATH";

    // Logging
    pub const LOG_LEVEL: &str = "XREF_LOG_LEVEL";
    pub const STRUCTURED_LOGGING: &str = "XREF_STRUCTURED_LOGGING";
    pub const LOG_BACKEND: &str = "XREF_LOG_BACKEND";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("1"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_log_backend_parsing() {
        assert_eq!(parse_log_backend("Console"), Some(LogBackend::Console));
        assert_eq!(parse_log_backend("log"), Some(LogBackend::Facade));
        assert_eq!(parse_log_backend("syslog"), None);
    }

    #[test]
    fn test_preferences_deserialize_partially() {
        let prefs: ToolPreferences = toml::from_str("timeout_secs = 5").unwrap();
        assert_eq!(prefs.timeout_secs, 5);
        assert!(!prefs.search_path.is_empty());

        let logging: LoggingPreferences =
            toml::from_str("min_log_level = \"debug\"\nbackend = \"facade\"").unwrap();
        assert_eq!(logging.min_log_level, LogLevel::Debug);
        assert_eq!(logging.backend, LogBackend::Facade);
    }
}
