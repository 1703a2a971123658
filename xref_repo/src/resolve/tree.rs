//! Directory listings

use super::{non_empty, object_spec, with_submodule_fallback};
use crate::error::RepoResult;
use crate::repository::{RepoHandle, RepoPath};
use std::fmt;
use xref_lexer::log_warning;
use xref_lexer::logging::codes;

/// Kind of a tree entry; declaration order is the reverse of listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntryKind {
    Blob,
    Commit,
    Tree,
}

impl EntryKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "blob" => Some(EntryKind::Blob),
            "commit" => Some(EntryKind::Commit),
            "tree" => Some(EntryKind::Tree),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Blob => "blob",
            EntryKind::Commit => "commit",
            EntryKind::Tree => "tree",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub kind: EntryKind,
    pub name: String,
    /// Size column as reported, `-` for trees and gitlinks
    pub size: String,
}

/// List `path`, descending into nested repositories when the root has no
/// such directory
///
/// Hidden entries are dropped and gitlinks mounted as a known nested
/// repository are reported as trees. Directories come first, then names
/// ordered case-insensitively.
pub fn list_directory(root: &RepoHandle, path: &RepoPath) -> RepoResult<Vec<DirEntry>> {
    let listing = with_submodule_fallback(root, path, |handle, local| {
        let Some(spec) = object_spec(handle, local)? else {
            return Ok(None);
        };
        Ok(non_empty(handle.git(&["ls-tree", "-l", &spec])?))
    })?;
    let Some(listing) = listing else {
        return Ok(Vec::new());
    };

    let index = root.submodules();
    let mut entries: Vec<DirEntry> = String::from_utf8_lossy(&listing)
        .lines()
        .filter_map(parse_line)
        .filter(|entry| !entry.name.starts_with('.'))
        .map(|mut entry| {
            if entry.kind == EntryKind::Commit && index.owner_of(&path.join(&entry.name)).is_some()
            {
                entry.kind = EntryKind::Tree;
            }
            entry
        })
        .collect();

    entries.sort_by(|a, b| {
        b.kind
            .cmp(&a.kind)
            .then_with(|| a.name.to_ascii_lowercase().cmp(&b.name.to_ascii_lowercase()))
    });

    Ok(entries)
}

/// `<type> <name> <size>` per entry; nothing at all for an empty listing
pub fn render_listing(entries: &[DirEntry]) -> Vec<u8> {
    entries
        .iter()
        .map(|e| format!("{} {} {}\n", e.kind, e.name, e.size))
        .collect::<String>()
        .into_bytes()
}

/// `<mode> <type> <id> <size>\t<name>`
fn parse_line(line: &str) -> Option<DirEntry> {
    let parsed = line.split_once('\t').and_then(|(meta, name)| {
        let mut fields = meta.split_whitespace();
        let _mode = fields.next()?;
        let kind = EntryKind::parse(fields.next()?)?;
        let _id = fields.next()?;
        let size = fields.next()?;
        Some(DirEntry {
            kind,
            name: name.to_string(),
            size: size.to_string(),
        })
    });

    if parsed.is_none() {
        log_warning!(code = codes::resolution::MALFORMED_TOOL_OUTPUT,
            "Skipping unrecognized tree entry",
            "line" => line
        );
    }
    parsed
}
