//! Command table of the xref backend

use clap::{Parser, Subcommand};
use std::io::Write;
use thiserror::Error;
use xref_lexer::logging::{codes, Code};
use xref_repo::{QueryEngine, RepoError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("Cannot write output: {0}")]
    Output(#[from] std::io::Error),
}

impl CliError {
    pub fn error_code(&self) -> Code {
        match self {
            CliError::Repo(e) => e.error_code(),
            CliError::Output(_) => codes::command::OUTPUT_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// xref - versioned source cross-reference queries over git storage
#[derive(Parser, Debug)]
#[command(name = "xref", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Release versions, newest first
    #[command(disable_help_flag = true)]
    ListTags {
        /// Prefix each version with its major and minor line labels
        #[arg(short = 'h')]
        annotated: bool,
    },

    /// Newest version
    GetLatest,

    /// Object type of a path at a version
    GetType { version: String, path: String },

    /// Blob content by object id, searching every repository
    GetBlob { object_id: String },

    /// File content at a version
    GetFile { version: String, path: String },

    /// Directory listing at a version
    GetDir { version: String, path: String },

    /// Every blob at a version as `<id> <path>` (-p) or `<id> <basename>` (-f)
    ListBlobs {
        #[arg(allow_hyphen_values = true)]
        mode: String,
        version: String,
    },

    /// Separator and identifier lines for a file or, with -b, a blob
    TokenizeFile {
        #[arg(short = 'b', value_name = "OBJECT_ID", conflicts_with_all = ["version", "path"])]
        blob: Option<String>,
        #[arg(required_unless_present = "blob")]
        version: Option<String>,
        #[arg(required_unless_present = "blob")]
        path: Option<String>,
    },

    /// Definitions in a blob as `<name> <kind> <line>`
    ParseDefs { object_id: String, filename: String },

    /// Print every repository, fetching each one when given `fetch`
    Update { mode: Option<String> },

    /// Anything else is handed to ./script.sh
    #[command(external_subcommand)]
    External(Vec<String>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ListTags { .. } => "list-tags",
            Command::GetLatest => "get-latest",
            Command::GetType { .. } => "get-type",
            Command::GetBlob { .. } => "get-blob",
            Command::GetFile { .. } => "get-file",
            Command::GetDir { .. } => "get-dir",
            Command::ListBlobs { .. } => "list-blobs",
            Command::TokenizeFile { .. } => "tokenize-file",
            Command::ParseDefs { .. } => "parse-defs",
            Command::Update { .. } => "update",
            Command::External(_) => "external",
        }
    }

    /// Version the query is pinned at, when it names one
    pub fn version(&self) -> Option<&str> {
        match self {
            Command::GetType { version, .. }
            | Command::GetFile { version, .. }
            | Command::GetDir { version, .. }
            | Command::ListBlobs { version, .. } => Some(version),
            Command::TokenizeFile { version, .. } => version.as_deref(),
            _ => None,
        }
    }

    pub fn run(&self, engine: &QueryEngine, out: &mut dyn Write) -> Result<()> {
        let bytes = match self {
            Command::ListTags { annotated } => engine.list_tags(*annotated)?,
            Command::GetLatest => engine.get_latest()?,
            Command::GetType { version, path } => engine.get_type(version, path)?,
            Command::GetBlob { object_id } => engine.get_blob(object_id)?,
            Command::GetFile { version, path } => engine.get_file(version, path)?,
            Command::GetDir { version, path } => engine.get_dir(version, path)?,
            Command::ListBlobs { mode, version } => engine.list_blobs(mode, version)?,
            Command::TokenizeFile {
                blob: Some(object_id),
                ..
            } => engine.tokenize_blob(object_id)?,
            Command::TokenizeFile {
                version: Some(version),
                path: Some(path),
                ..
            } => engine.tokenize_file(version, path)?,
            Command::TokenizeFile { .. } => Vec::new(),
            Command::ParseDefs {
                object_id,
                filename,
            } => engine.parse_defs(object_id, filename)?,
            Command::Update { mode } => {
                engine.update(mode.as_deref() == Some("fetch"), out)?;
                Vec::new()
            }
            Command::External(argv) => match argv.split_first() {
                Some((command, args)) => engine.external(command, args)?,
                None => Vec::new(),
            },
        };

        out.write_all(&bytes)?;
        Ok(())
    }
}
