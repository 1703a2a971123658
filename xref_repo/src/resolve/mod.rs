//! Path resolution across repository boundaries
//!
//! A query that comes back empty in one repository is retried in the nested
//! repository owning the path, with the path rewritten relative to that
//! repository's mount point. Each retry moves strictly deeper, so the chain
//! ends after at most one step per nesting level.

pub mod blob;
pub mod tree;

pub use blob::{get_blob, get_blob_by_object_id, get_type, list_blobs, ListMode};
pub use tree::{list_directory, render_listing, DirEntry, EntryKind};

use crate::error::RepoResult;
use crate::repository::{RepoHandle, RepoPath};
use xref_lexer::logging::codes;
use xref_lexer::{log_debug, log_warning};

/// Ask `query` in the root, then in each deeper owner of `path` in turn
///
/// `query` receives the handle and the path local to it and returns `None`
/// for a miss.
pub(crate) fn with_submodule_fallback<T>(
    root: &RepoHandle,
    path: &RepoPath,
    mut query: impl FnMut(&RepoHandle, &RepoPath) -> RepoResult<Option<T>>,
) -> RepoResult<Option<T>> {
    let index = root.submodules();
    let mut current: &RepoHandle = root;
    let mut local = path.clone();

    loop {
        if let Some(found) = query(current, &local)? {
            return Ok(Some(found));
        }

        // A string-prefix owner may not contain the path component-wise
        // (`/lib/sub` vs `/lib/subx/a.c`); try the next candidate then.
        let mut rejected = None;
        let next = index
            .owners_below(path, current.rel())
            .find_map(|owner| match path.strip_mount(owner.rel()) {
                Some(rewritten) => Some((owner, rewritten)),
                None => {
                    rejected.get_or_insert(owner);
                    None
                }
            });

        match next {
            Some((owner, rewritten)) => {
                local = rewritten;
                current = owner.as_ref();
            }
            None => {
                match rejected {
                    Some(owner) => {
                        log_warning!(code = codes::resolution::PATH_OUTSIDE_MOUNT,
                            "Owning repository does not contain path",
                            "path" => path,
                            "mount" => owner.rel()
                        );
                    }
                    None => {
                        log_debug!(code = codes::resolution::PATH_NOT_FOUND, "Path not found",
                            "path" => path,
                            "searched_to" => current.rel()
                        );
                    }
                }
                return Ok(None);
            }
        }
    }
}

/// `<tag>:<path>` for a handle, or `None` when its tag is unresolved
pub(crate) fn object_spec(handle: &RepoHandle, path: &RepoPath) -> RepoResult<Option<String>> {
    let tag = handle.tag()?;
    if tag.is_empty() {
        return Ok(None);
    }
    Ok(Some(format!("{}:{}", tag, path.without_leading_slash())))
}

pub(crate) fn non_empty(bytes: Vec<u8>) -> Option<Vec<u8>> {
    (!bytes.is_empty()).then_some(bytes)
}
