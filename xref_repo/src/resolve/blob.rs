//! File contents, object types and blob inventories

use super::{non_empty, object_spec, with_submodule_fallback};
use crate::error::RepoResult;
use crate::repository::{RepoHandle, RepoPath};
use std::rc::Rc;
use xref_lexer::logging::codes;
use xref_lexer::{log_debug, log_warning};

/// Content of `path` at the root's tag, falling back into nested repositories
pub fn get_blob(root: &RepoHandle, path: &RepoPath) -> RepoResult<Vec<u8>> {
    cat_file(root, "blob", path)
}

/// Object type of `path` as git reports it (`blob\n`, `tree\n`, ...)
pub fn get_type(root: &RepoHandle, path: &RepoPath) -> RepoResult<Vec<u8>> {
    cat_file(root, "-t", path)
}

fn cat_file(root: &RepoHandle, mode: &str, path: &RepoPath) -> RepoResult<Vec<u8>> {
    let found = with_submodule_fallback(root, path, |handle, local| {
        let Some(spec) = object_spec(handle, local)? else {
            return Ok(None);
        };
        Ok(non_empty(handle.git(&["cat-file", mode, &spec])?))
    })?;
    Ok(found.unwrap_or_default())
}

/// Look an object id up in the root store, then in each nested store
pub fn get_blob_by_object_id(root: &Rc<RepoHandle>, object_id: &str) -> RepoResult<Vec<u8>> {
    for repo in std::iter::once(root).chain(root.submodules().iter()) {
        let content = repo.git(&["cat-file", "blob", object_id])?;
        if !content.is_empty() {
            log_debug!("Object found", "id" => object_id, "repo" => repo.rel());
            return Ok(content);
        }
    }
    log_debug!(code = codes::resolution::PATH_NOT_FOUND, "Object not found in any store",
        "id" => object_id
    );
    Ok(Vec::new())
}

/// Shape of each `list-blobs` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// `<id> <path>`
    Paths,
    /// `<id> <basename>`
    Basenames,
}

impl ListMode {
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "-p" => Some(ListMode::Paths),
            "-f" => Some(ListMode::Basenames),
            _ => None,
        }
    }
}

/// Every blob reachable from the root's tag, nested repositories included
/// at their recorded commits
pub fn list_blobs(root: &Rc<RepoHandle>, mode: ListMode) -> RepoResult<Vec<u8>> {
    let mut out = String::new();

    for repo in std::iter::once(root).chain(root.submodules().iter()) {
        let tag = repo.tag()?;
        if tag.is_empty() {
            continue;
        }
        let listing = repo.git(&["ls-tree", "-r", tag])?;

        for line in String::from_utf8_lossy(&listing).lines() {
            let Some((meta, path)) = line.split_once('\t') else {
                log_warning!(code = codes::resolution::MALFORMED_TOOL_OUTPUT,
                    "Skipping unrecognized tree entry",
                    "line" => line
                );
                continue;
            };
            let mut fields = meta.split_whitespace();
            let (Some(_mode), Some(kind), Some(id)) = (fields.next(), fields.next(), fields.next())
            else {
                continue;
            };
            if kind != "blob" {
                continue;
            }

            let full = repo.rel().join(path);
            let shown = match mode {
                ListMode::Paths => full.without_leading_slash(),
                ListMode::Basenames => full.file_name().unwrap_or_default(),
            };
            out.push_str(id);
            out.push(' ');
            out.push_str(shown);
            out.push('\n');
        }
    }

    Ok(out.into_bytes())
}
