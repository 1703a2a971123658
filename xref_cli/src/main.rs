//! # xref CLI
//!
//! Answers one cross-reference query per invocation. Results go to stdout
//! as raw bytes; diagnostics go to stderr.

mod commands;

use clap::Parser;
use commands::{Cli, CliError};
use std::io::Write;
use xref_lexer::config::{LogBackend, LoggingPreferences};
use xref_lexer::logging::{self, QueryContext};
use xref_lexer::{log_debug, log_error, XrefConfig};
use xref_repo::QueryEngine;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match XrefConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(LoggingPreferences::default())?;
            log_error!(e.error_code(), "Invalid configuration", "reason" => e);
            return Err(e.into());
        }
    };
    init_logging(config.logging.clone())?;
    log_debug!("xref starting",
        "repo_dir" => config.repo_dir.display(),
        "command" => cli.command.name()
    );

    let engine = QueryEngine::new(&config);
    let context = QueryContext::new(cli.command.name(), cli.command.version());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = logging::with_query_context(context, || cli.command.run(&engine, &mut out));

    match result.and_then(|()| out.flush().map_err(CliError::from)) {
        Ok(()) => Ok(()),
        Err(e) => {
            log_error!(e.error_code(), "Query failed", "reason" => e);
            Err(e.into())
        }
    }
}

/// Install the coded logging service, plus env_logger when events are
/// forwarded to the `log` facade
fn init_logging(preferences: LoggingPreferences) -> Result<(), String> {
    if preferences.backend == LogBackend::Facade {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .target(env_logger::Target::Stderr)
            .try_init()
            .map_err(|e| e.to_string())?;
    }
    logging::init_global_logging(preferences)
}
