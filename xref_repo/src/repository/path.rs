//! Absolute, normalized paths inside a repository tree

use std::fmt;

/// A path below a repository root, always starting with `/`
///
/// Empty and `.` components are dropped, so `py//./obj.c` and `/py/obj.c`
/// are the same path. The root is `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoPath(String);

impl RepoPath {
    pub fn root() -> Self {
        RepoPath("/".to_string())
    }

    pub fn new(path: &str) -> Self {
        let mut normalized = String::with_capacity(path.len() + 1);
        for component in path.split('/').filter(|c| !c.is_empty() && *c != ".") {
            normalized.push('/');
            normalized.push_str(component);
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        RepoPath(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Form used in `<tag>:<path>` object specs and `ls-tree` pathspecs
    pub fn without_leading_slash(&self) -> &str {
        &self.0[1..]
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    pub fn depth(&self) -> usize {
        self.components().count()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.components().last()
    }

    pub fn join(&self, relative: &str) -> Self {
        RepoPath::new(&format!("{}/{}", self.0, relative))
    }

    /// Plain string prefix test, so `/lib/sub` covers `/lib/subx` too
    pub fn has_prefix(&self, prefix: &RepoPath) -> bool {
        self.0.starts_with(prefix.as_str())
    }

    /// Component-wise containment; a path is not its own proper ancestor
    pub fn is_proper_ancestor_of(&self, other: &RepoPath) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other
            .0
            .strip_prefix(self.as_str())
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
    }

    /// Rewrite this path relative to a mount point
    ///
    /// Returns `None` when the mount is not a component-wise prefix.
    pub fn strip_mount(&self, mount: &RepoPath) -> Option<RepoPath> {
        if mount.is_root() {
            return Some(self.clone());
        }
        if self == mount {
            return Some(RepoPath::root());
        }
        self.0
            .strip_prefix(mount.as_str())
            .filter(|rest| rest.starts_with('/'))
            .map(RepoPath::new)
    }
}

impl Default for RepoPath {
    fn default() -> Self {
        RepoPath::root()
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepoPath {
    fn from(path: &str) -> Self {
        RepoPath::new(path)
    }
}
