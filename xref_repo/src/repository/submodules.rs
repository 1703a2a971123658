//! Discovery of nested repositories stored beside the root

use super::handle::RepoHandle;
use super::path::RepoPath;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;
use walkdir::WalkDir;
use xref_lexer::config::compile_time::repository::{
    MAX_DISCOVERY_DEPTH, REPOSITORY_MARKER, SKIPPED_STORAGE_DIRS, SUBMODULES_DIR,
};
use xref_lexer::logging::codes;
use xref_lexer::{log_debug, log_performance, log_warning};

/// Flat index of every nested repository, ordered by mount point
///
/// Ancestors sort before their descendants, so the first prefix match is
/// always the outermost owner.
#[derive(Debug, Default)]
pub struct SubmoduleIndex {
    entries: Vec<Rc<RepoHandle>>,
}

impl SubmoduleIndex {
    /// Scan `<root storage>/../submodules` for repository markers at any depth
    pub(crate) fn discover(root: &RepoHandle) -> Self {
        let Some(scan_root) = root.path().parent().map(|p| p.join(SUBMODULES_DIR)) else {
            return Self::default();
        };
        if !scan_root.is_dir() {
            log_debug!("No nested repository storage", "dir" => scan_root.display());
            return Self::default();
        }

        let start = Instant::now();
        let mut entries: Vec<Rc<RepoHandle>> = Vec::new();

        let mut walker = WalkDir::new(&scan_root)
            .min_depth(1)
            .max_depth(MAX_DISCOVERY_DEPTH)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log_warning!(code = codes::resolution::SUBMODULE_SCAN_FAILED,
                        "Skipping unreadable storage entry",
                        "dir" => scan_root.display(),
                        "reason" => e
                    );
                    continue;
                }
            };
            let is_dir = entry.file_type().is_dir();

            if entry.file_name() == REPOSITORY_MARKER {
                if let Some(storage) = entry.path().parent() {
                    match mount_point(&scan_root, storage) {
                        Some(rel) => {
                            entries.push(RepoHandle::nested(storage.to_path_buf(), rel, root))
                        }
                        None => log_debug!("Ignoring marker at storage root",
                            "path" => entry.path().display()
                        ),
                    }
                }
                if is_dir {
                    walker.skip_current_dir();
                }
                continue;
            }

            // Object stores and reflogs of a repository never hold nested ones
            if is_dir && is_repository_internal(entry.path()) {
                walker.skip_current_dir();
            }
        }

        entries.sort_by(|a, b| a.rel().cmp(b.rel()));

        log_performance!(codes::success::SUBMODULE_DISCOVERY_COMPLETE,
            "Nested repositories discovered",
            duration = start.elapsed(),
            "count" => entries.len(),
            "dir" => scan_root.display()
        );

        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<RepoHandle>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First repository whose mount point is a string prefix of `path`
    pub fn owner_of(&self, path: &RepoPath) -> Option<&Rc<RepoHandle>> {
        self.entries.iter().find(|sub| path.has_prefix(sub.rel()))
    }

    /// Like [`owner_of`](Self::owner_of), restricted to mounts deeper than
    /// `current` so repeated fallback always descends
    pub fn owner_below(&self, path: &RepoPath, current: &RepoPath) -> Option<&Rc<RepoHandle>> {
        self.owners_below(path, current).next()
    }

    /// Every prefix owner of `path` deeper than `current`, in mount order
    pub fn owners_below<'a, 'b>(
        &'a self,
        path: &'b RepoPath,
        current: &'b RepoPath,
    ) -> impl Iterator<Item = &'a Rc<RepoHandle>> + 'b
    where
        'a: 'b,
    {
        self.entries.iter().filter(move |sub| {
            sub.rel().as_str().len() > current.as_str().len() && path.has_prefix(sub.rel())
        })
    }

    /// Nearest step from `via` towards `target`: the first repository
    /// mounted strictly between them
    pub(crate) fn enclosing(&self, target: &RepoPath, via: &RepoPath) -> Option<&Rc<RepoHandle>> {
        self.entries.iter().find(|sub| {
            sub.rel().depth() > via.depth()
                && sub.rel().is_proper_ancestor_of(target)
                && (via.is_root() || via.is_proper_ancestor_of(sub.rel()))
        })
    }
}

fn mount_point(scan_root: &Path, storage: &Path) -> Option<RepoPath> {
    let relative = storage.strip_prefix(scan_root).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(RepoPath::new(&relative.to_string_lossy()))
}

fn is_repository_internal(dir: &Path) -> bool {
    let named = dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| SKIPPED_STORAGE_DIRS.contains(&n))
        .unwrap_or(false);
    named
        && dir
            .parent()
            .map(|p| p.join(REPOSITORY_MARKER).exists())
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::scripted::ScriptedRunner;
    use std::fs;

    fn layout(mounts: &[&str]) -> (tempfile::TempDir, Rc<RepoHandle>) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("repo/refs/tags")).unwrap();
        for mount in mounts {
            let store = dir.path().join("submodules").join(mount);
            fs::create_dir_all(store.join("refs/heads")).unwrap();
            fs::create_dir_all(store.join("objects/pack")).unwrap();
            fs::create_dir_all(store.join("logs/refs/heads")).unwrap();
        }
        let root = RepoHandle::root(
            dir.path().join("repo"),
            Some("1.0.0"),
            Rc::new(ScriptedRunner::new()),
        );
        (dir, root)
    }

    fn mounts(index: &SubmoduleIndex) -> Vec<String> {
        index.iter().map(|s| s.rel().to_string()).collect()
    }

    #[test]
    fn test_no_storage_dir_means_no_submodules() {
        let (_dir, root) = layout(&[]);
        assert!(root.submodules().is_empty());
    }

    #[test]
    fn test_discovers_nested_mounts_in_order() {
        let (_dir, root) = layout(&["lib/tinyusb", "ports/esp/idf", "lib/a", "lib/a/lib/b"]);

        assert_eq!(
            mounts(root.submodules()),
            vec!["/lib/a", "/lib/a/lib/b", "/lib/tinyusb", "/ports/esp/idf"]
        );
    }

    #[test]
    fn test_reflog_refs_are_not_repositories() {
        let (_dir, root) = layout(&["lib/sub"]);
        let listed = mounts(root.submodules());
        assert_eq!(listed, vec!["/lib/sub"]);
    }

    #[test]
    fn test_discovered_handles_point_back_at_root() {
        let (dir, root) = layout(&["lib/sub"]);
        let sub = root.submodules().iter().next().unwrap();

        assert!(!sub.is_root());
        assert_eq!(sub.path(), dir.path().join("submodules/lib/sub"));
        assert!(Rc::ptr_eq(&sub.parent().unwrap(), &root));
        assert!(sub.submodules().is_empty());
    }

    #[test]
    fn test_discovery_is_cached() {
        let (dir, root) = layout(&["lib/sub"]);
        assert_eq!(root.submodules().len(), 1);

        fs::create_dir_all(dir.path().join("submodules/lib/late/refs")).unwrap();
        assert_eq!(root.submodules().len(), 1);
    }

    #[test]
    fn test_owner_of_uses_string_prefix() {
        let (_dir, root) = layout(&["lib/sub"]);
        let index = root.submodules();

        let owner = index.owner_of(&RepoPath::new("/lib/sub/src/a.c")).unwrap();
        assert_eq!(owner.rel().as_str(), "/lib/sub");
        assert!(index.owner_of(&RepoPath::new("/lib/subx/a.c")).is_some());
        assert!(index.owner_of(&RepoPath::new("/py/obj.c")).is_none());
    }

    #[test]
    fn test_owner_below_descends() {
        let (_dir, root) = layout(&["lib/a", "lib/a/lib/b"]);
        let index = root.submodules();
        let path = RepoPath::new("/lib/a/lib/b/x.c");

        let first = index.owner_below(&path, &RepoPath::root()).unwrap();
        assert_eq!(first.rel().as_str(), "/lib/a");
        let second = index.owner_below(&path, first.rel()).unwrap();
        assert_eq!(second.rel().as_str(), "/lib/a/lib/b");
        assert!(index.owner_below(&path, second.rel()).is_none());
    }

    #[test]
    fn test_owners_below_lists_every_prefix_match() {
        let (_dir, root) = layout(&["lib/sub", "lib/subx"]);
        let index = root.submodules();
        let path = RepoPath::new("/lib/subx/a.c");

        let owners: Vec<&str> = index
            .owners_below(&path, &RepoPath::root())
            .map(|sub| sub.rel().as_str())
            .collect();
        assert_eq!(owners, vec!["/lib/sub", "/lib/subx"]);
    }

    #[test]
    fn test_enclosing_steps_one_level() {
        let (_dir, root) = layout(&["lib/a", "lib/a/lib/b", "lib/a/lib/b/c"]);
        let index = root.submodules();
        let target = RepoPath::new("/lib/a/lib/b/c");

        let step = index.enclosing(&target, &RepoPath::root()).unwrap();
        assert_eq!(step.rel().as_str(), "/lib/a");
        let step = index.enclosing(&target, step.rel()).unwrap();
        assert_eq!(step.rel().as_str(), "/lib/a/lib/b");
        assert!(index.enclosing(&target, step.rel()).is_none());
    }
}
