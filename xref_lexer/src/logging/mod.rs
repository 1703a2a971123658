//! Global logging module for the xref backend
//!
//! Provides a process-wide logging service with per-thread query context and
//! a coded macro interface. Nothing is emitted until [`init_global_logging`]
//! runs, so library callers that never initialize stay silent.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

#[cfg(feature = "logging")]
pub use service::LogFacadeLogger;

use crate::config::runtime::LoggingPreferences;

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

thread_local! {
    static QUERY_CONTEXT: RefCell<Option<QueryContext>> = const { RefCell::new(None) };
}

/// The command being answered, attached to every event on this thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    pub command: String,
    pub version: Option<String>,
}

impl QueryContext {
    pub fn new(command: &str, version: Option<&str>) -> Self {
        Self {
            command: command.to_string(),
            version: version.map(str::to_string),
        }
    }
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from preferences
pub fn init_global_logging(preferences: LoggingPreferences) -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;
    config::init_runtime_preferences(preferences)?;

    let logging_service = Arc::new(service::create_configured_service());

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized".to_string())?;

    for code in ["ERR001", "E005", "E023", "E041"] {
        if codes::get_description(code) == "Unknown error" {
            return Err(format!("Missing metadata for error code: {}", code));
        }
    }

    logging_service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Safe access to global logger
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

/// Whether a debug event would be delivered (used by `log_debug!`)
pub fn debug_enabled() -> bool {
    try_get_global_logger()
        .map(|logger| logger.should_log(LogLevel::Debug))
        .unwrap_or(false)
}

// ============================================================================
// QUERY CONTEXT MANAGEMENT
// ============================================================================

pub fn set_query_context(context: QueryContext) {
    QUERY_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(context);
    });
}

pub fn clear_query_context() {
    QUERY_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
}

/// Execute function with query context
pub fn with_query_context<F, R>(context: QueryContext, f: F) -> R
where
    F: FnOnce() -> R,
{
    set_query_context(context);
    let result = f();
    clear_query_context();
    result
}

pub fn get_current_query_context() -> Option<QueryContext> {
    QUERY_CONTEXT.with(|ctx| ctx.borrow().clone())
}

// ============================================================================
// MACRO SUPPORT
// ============================================================================

/// Attach query context and deliver to the global service
pub fn emit(mut event: LogEvent) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };

    if let Some(query) = get_current_query_context() {
        event = event.with_context("command", &query.command);
        if let Some(version) = &query.version {
            event = event.with_context("version", version);
        }
    }

    logger.log_event(event);
}

/// Error logging that falls back to stderr before initialization
pub fn safe_log_error(code: Code, message: &str) {
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(LogEvent::error(code, message));
    } else {
        eprintln!("[ERROR] {} - {}", code.as_str(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_context_management() {
        assert!(get_current_query_context().is_none());

        set_query_context(QueryContext::new("get-dir", Some("1.0.0")));
        let context = get_current_query_context().unwrap();
        assert_eq!(context.command, "get-dir");
        assert_eq!(context.version.as_deref(), Some("1.0.0"));

        clear_query_context();
        assert!(get_current_query_context().is_none());
    }

    #[test]
    fn test_with_query_context() {
        let result = with_query_context(QueryContext::new("list-tags", None), || {
            assert_eq!(get_current_query_context().unwrap().command, "list-tags");
            42
        });

        assert_eq!(result, 42);
        assert!(get_current_query_context().is_none());
    }

    #[test]
    fn test_emit_without_logger_is_silent() {
        if is_initialized() {
            return;
        }
        emit(LogEvent::info("dropped"));
        safe_log_error(codes::system::INTERNAL_ERROR, "fallback to stderr");
        assert!(!debug_enabled());
    }
}
