//! Logging macros over Code types
//!
//! Context values may be any `Display` type: `"key" => value`.

/// Log error with Code type
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr) => {
        $crate::logging::emit($crate::logging::LogEvent::error($code, $message))
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut event = $crate::logging::LogEvent::error($code, $message);
            $(
                event = event.with_context($key, &format!("{}", $value));
            )+
            $crate::logging::emit(event)
        }
    };
}

/// Log success with Code type
#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr) => {
        $crate::logging::emit($crate::logging::LogEvent::success($code, $message))
    };

    ($code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut event = $crate::logging::LogEvent::success($code, $message);
            $(
                event = event.with_context($key, &format!("{}", $value));
            )+
            $crate::logging::emit(event)
        }
    };
}

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::logging::emit($crate::logging::LogEvent::info($message))
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut event = $crate::logging::LogEvent::info($message);
            $(
                event = event.with_context($key, &format!("{}", $value));
            )+
            $crate::logging::emit(event)
        }
    };
}

/// Log warning, optionally with a specific code: `log_warning!(code = c, "msg")`
#[macro_export]
macro_rules! log_warning {
    (code = $code:expr, $message:expr) => {
        $crate::logging::emit($crate::logging::LogEvent::warning_with_code($code, $message))
    };

    (code = $code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut event = $crate::logging::LogEvent::warning_with_code($code, $message);
            $(
                event = event.with_context($key, &format!("{}", $value));
            )+
            $crate::logging::emit(event)
        }
    };

    ($message:expr) => {
        $crate::logging::emit($crate::logging::LogEvent::warning($message))
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut event = $crate::logging::LogEvent::warning($message);
            $(
                event = event.with_context($key, &format!("{}", $value));
            )+
            $crate::logging::emit(event)
        }
    };
}

/// Log debug message; context is only formatted when debug output is enabled
#[macro_export]
macro_rules! log_debug {
    (code = $code:expr, $message:expr) => {
        if $crate::logging::debug_enabled() {
            $crate::logging::emit($crate::logging::LogEvent::debug_with_code($code, $message))
        }
    };

    (code = $code:expr, $message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        if $crate::logging::debug_enabled() {
            let mut event = $crate::logging::LogEvent::debug_with_code($code, $message);
            $(
                event = event.with_context($key, &format!("{}", $value));
            )+
            $crate::logging::emit(event)
        }
    };

    ($message:expr) => {
        if $crate::logging::debug_enabled() {
            $crate::logging::emit($crate::logging::LogEvent::debug($message))
        }
    };

    ($message:expr, $($key:expr => $value:expr),+ $(,)?) => {
        if $crate::logging::debug_enabled() {
            let mut event = $crate::logging::LogEvent::debug($message);
            $(
                event = event.with_context($key, &format!("{}", $value));
            )+
            $crate::logging::emit(event)
        }
    };
}

/// Log success with elapsed time in milliseconds
#[macro_export]
macro_rules! log_performance {
    ($code:expr, $message:expr, duration = $duration:expr) => {
        $crate::log_success!($code, $message,
            "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0)
        )
    };

    ($code:expr, $message:expr, duration = $duration:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $crate::log_success!($code, $message,
            "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0),
            $($key => $value),+
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::codes;

    #[test]
    fn test_macros_are_noops_without_global_logger() {
        let path = std::path::PathBuf::from("/py/objstr.c");
        let duration = std::time::Duration::from_millis(3);

        log_error!(codes::tool::TIMEOUT, "git timed out", "timeout_ms" => 60_000u64);
        log_success!(codes::success::CATALOG_BUILT, "catalog", "versions" => 3);
        log_info!("query", "command" => "get-dir");
        log_warning!("plain warning");
        log_warning!(code = codes::resolution::PATH_NOT_FOUND, "miss", "path" => path.display());
        log_debug!("debug", "bytes" => 10usize);
        log_debug!(code = codes::tool::NON_ZERO_EXIT, "exit 128");
        log_performance!(codes::success::TOKENIZATION_COMPLETE, "tokenized",
            duration = duration,
            "units" => 4
        );
    }
}
