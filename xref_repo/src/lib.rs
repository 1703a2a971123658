//! # xref_repo
//!
//! Versioned, submodule-aware resolution over bare git storage for the
//! cross-reference backend: release catalogs, directory listings, blob
//! contents, definition extraction and repository updates.

pub mod defs;
pub mod engine;
pub mod error;
pub mod repository;
pub mod resolve;
pub mod tools;
pub mod update;

// Convenience re-exports
pub use engine::QueryEngine;
pub use error::{RepoError, RepoResult};
pub use repository::{RepoHandle, RepoPath, SubmoduleIndex, Version, VersionCatalog};
pub use resolve::{DirEntry, EntryKind, ListMode};
pub use tools::{CommandError, CommandOutput, CommandRunner, SystemCommandExecutor};
