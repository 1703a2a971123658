//! Repository model: handles, nested repository index and the release catalog

pub mod handle;
pub mod path;
pub mod submodules;
pub mod versions;

pub use handle::RepoHandle;
pub use path::RepoPath;
pub use submodules::SubmoduleIndex;
pub use versions::{Component, Number, Version, VersionCatalog};
