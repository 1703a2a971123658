//! Errors surfaced by repository queries
//!
//! A resolution miss is not an error: it is an empty byte string or an empty
//! listing. Only failures that make the answer untrustworthy end up here.

use crate::tools::CommandError;
use std::path::PathBuf;
use xref_lexer::logging::{codes, Code};
use xref_lexer::{ConfigError, TokenizerError};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Tool(#[from] CommandError),

    #[error("No release tags found in {path}")]
    EmptyCatalog { path: PathBuf },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error("Invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: &'static str, reason: String },
}

impl RepoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepoError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            RepoError::Tool(e) => e.error_code(),
            RepoError::EmptyCatalog { .. } => codes::catalog::EMPTY_CATALOG,
            RepoError::Config(e) => e.error_code(),
            RepoError::Io { .. } => codes::system::INTERNAL_ERROR,
            RepoError::Tokenizer(e) => e.error_code(),
            RepoError::Pattern { .. } => codes::system::INTERNAL_ERROR,
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
