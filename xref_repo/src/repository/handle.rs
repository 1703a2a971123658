//! Repository handles pinned at a commit-ish

use super::path::RepoPath;
use super::submodules::SubmoduleIndex;
use crate::error::RepoResult;
use crate::tools::{CommandOutput, CommandRunner, GIT};
use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::time::Duration;
use xref_lexer::logging::codes;
use xref_lexer::{log_debug, log_warning};

/// One repository in storage, pinned at a tag or commit id
///
/// The root handle owns the index of nested repositories; each nested handle
/// points back at the root without owning it and resolves its own commit id
/// from the gitlink recorded in the tree above it, at most once.
pub struct RepoHandle {
    path: PathBuf,
    rel: RepoPath,
    tag: OnceCell<String>,
    parent: Option<Weak<RepoHandle>>,
    this: Weak<RepoHandle>,
    runner: Rc<dyn CommandRunner>,
    submodules: OnceCell<SubmoduleIndex>,
}

impl RepoHandle {
    /// Open the root repository; `None` leaves the tag empty
    pub fn root(
        path: impl Into<PathBuf>,
        tag: Option<&str>,
        runner: Rc<dyn CommandRunner>,
    ) -> Rc<Self> {
        let path = path.into();
        Rc::new_cyclic(|this| RepoHandle {
            path,
            rel: RepoPath::root(),
            tag: OnceCell::from(tag.unwrap_or_default().to_string()),
            parent: None,
            this: this.clone(),
            runner,
            submodules: OnceCell::new(),
        })
    }

    pub(crate) fn nested(path: PathBuf, rel: RepoPath, root: &RepoHandle) -> Rc<Self> {
        Rc::new_cyclic(|this| RepoHandle {
            path,
            rel,
            tag: OnceCell::new(),
            parent: Some(root.this.clone()),
            this: this.clone(),
            runner: Rc::clone(&root.runner),
            submodules: OnceCell::from(SubmoduleIndex::default()),
        })
    }

    /// Storage location on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mount point relative to the root repository
    pub fn rel(&self) -> &RepoPath {
        &self.rel
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<Rc<RepoHandle>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Nested repositories, discovered on first use
    ///
    /// Only the root carries an index; nested handles report an empty one.
    pub fn submodules(&self) -> &SubmoduleIndex {
        self.submodules
            .get_or_init(|| SubmoduleIndex::discover(self))
    }

    /// The commit-ish this handle is pinned at; empty means "no data"
    pub fn tag(&self) -> RepoResult<&str> {
        if let Some(tag) = self.tag.get() {
            return Ok(tag);
        }
        let resolved = self.resolve_tag()?;
        Ok(self.tag.get_or_init(|| resolved))
    }

    fn resolve_tag(&self) -> RepoResult<String> {
        let Some(root) = self.parent() else {
            log_warning!(code = codes::resolution::TAG_UNRESOLVED,
                "Parent repository is gone",
                "rel" => self.rel
            );
            return Ok(String::new());
        };

        let index = root.submodules();
        let mut via: &Rc<RepoHandle> = &root;

        loop {
            let via_tag = via.tag()?;
            if via_tag.is_empty() {
                return Ok(String::new());
            }

            let Some(local) = self.rel.strip_mount(via.rel()) else {
                return Ok(String::new());
            };
            let listing = via.git(&["ls-tree", "-d", via_tag, "--", local.without_leading_slash()])?;

            if let Some(commit) = gitlink_commit(&listing) {
                log_debug!(code = codes::success::TAG_RESOLVED, "Resolved nested repository",
                    "rel" => self.rel,
                    "commit" => commit,
                    "via" => via.rel()
                );
                return Ok(commit);
            }

            // The gitlink may live inside an intermediate nested repository
            match index.enclosing(&self.rel, via.rel()) {
                Some(next) => via = next,
                None => {
                    log_warning!(code = codes::resolution::TAG_UNRESOLVED,
                        "No gitlink recorded for nested repository",
                        "rel" => self.rel,
                        "path" => self.path.display()
                    );
                    return Ok(String::new());
                }
            }
        }
    }

    /// Run git in this repository and capture everything
    pub fn run_git(&self, args: &[&str], timeout: Option<Duration>) -> RepoResult<CommandOutput> {
        Ok(self.runner.run(GIT, args, &self.path, timeout)?)
    }

    /// Run git and return stdout; a non-zero exit is a miss
    pub fn git(&self, args: &[&str]) -> RepoResult<Vec<u8>> {
        let output = self.run_git(args, None)?;
        if !output.success() {
            log_debug!(code = codes::tool::NON_ZERO_EXIT, "git reported no result",
                "args" => args.join(" "),
                "exit_code" => output.exit_code,
                "repo" => self.path.display()
            );
            return Ok(Vec::new());
        }
        Ok(output.stdout)
    }
}

impl fmt::Debug for RepoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoHandle")
            .field("path", &self.path)
            .field("rel", &self.rel)
            .field("tag", &self.tag.get())
            .finish()
    }
}

/// Commit id from `ls-tree -d` output, only for gitlink entries
fn gitlink_commit(listing: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(listing);
    let line = text.lines().next()?;
    let mut fields = line.split_whitespace();
    let (_mode, kind, id) = (fields.next()?, fields.next()?, fields.next()?);
    (kind == "commit").then(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::scripted::{storage_layout as storage, ScriptedRunner};
    use assert_matches::assert_matches;

    const SUB_SHA: &str = "1111111111111111111111111111111111111111";
    const NESTED_SHA: &str = "2222222222222222222222222222222222222222";

    #[test]
    fn test_explicit_tag_is_not_resolved() {
        let runner = Rc::new(ScriptedRunner::new());
        let root = RepoHandle::root("/srv/repo", Some("1.0.0"), runner.clone());

        assert_eq!(root.tag().unwrap(), "1.0.0");
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_root_without_tag_is_empty() {
        let root = RepoHandle::root("/srv/repo", None, Rc::new(ScriptedRunner::new()));
        assert_eq!(root.tag().unwrap(), "");
    }

    #[test]
    fn test_nested_tag_resolved_once_from_gitlink() {
        let dir = storage(&["lib/sub"]);
        let repo = dir.path().join("repo");
        let runner = Rc::new(ScriptedRunner::new().on(
            &repo,
            "git ls-tree -d 1.0.0 -- lib/sub",
            &format!("160000 commit {SUB_SHA}\tlib/sub\n"),
        ));
        let root = RepoHandle::root(&repo, Some("1.0.0"), runner.clone());

        let sub = root.submodules().iter().next().unwrap().clone();
        assert_eq!(sub.rel().as_str(), "/lib/sub");
        assert_eq!(sub.tag().unwrap(), SUB_SHA);
        assert_eq!(sub.tag().unwrap(), SUB_SHA);
        assert_eq!(runner.call_count("git ls-tree -d 1.0.0 -- lib/sub"), 1);
    }

    #[test]
    fn test_plain_directory_is_not_a_gitlink() {
        let dir = storage(&["lib/sub"]);
        let repo = dir.path().join("repo");
        let runner = Rc::new(ScriptedRunner::new().on(
            &repo,
            "git ls-tree -d 1.0.0 -- lib/sub",
            &format!("040000 tree {SUB_SHA}\tlib/sub\n"),
        ));
        let root = RepoHandle::root(&repo, Some("1.0.0"), runner);

        let sub = root.submodules().iter().next().unwrap().clone();
        assert_eq!(sub.tag().unwrap(), "");
    }

    #[test]
    fn test_nested_two_levels_resolves_through_intermediate() {
        let dir = storage(&["lib/a", "lib/a/lib/b"]);
        let repo = dir.path().join("repo");
        let a_store = dir.path().join("submodules/lib/a");
        let runner = Rc::new(
            ScriptedRunner::new()
                .on(
                    &repo,
                    "git ls-tree -d 2.0.0 -- lib/a",
                    &format!("160000 commit {SUB_SHA}\tlib/a\n"),
                )
                .on(
                    &a_store,
                    &format!("git ls-tree -d {SUB_SHA} -- lib/b"),
                    &format!("160000 commit {NESTED_SHA}\tlib/b\n"),
                ),
        );
        let root = RepoHandle::root(&repo, Some("2.0.0"), runner);

        let nested = root
            .submodules()
            .iter()
            .find(|s| s.rel().as_str() == "/lib/a/lib/b")
            .unwrap()
            .clone();
        assert_eq!(nested.tag().unwrap(), NESTED_SHA);
    }

    #[test]
    fn test_tool_failure_propagates() {
        let dir = storage(&["lib/sub"]);
        let repo = dir.path().join("repo");
        let runner =
            Rc::new(ScriptedRunner::new().on_timeout(&repo, "git ls-tree -d 1.0.0 -- lib/sub"));
        let root = RepoHandle::root(&repo, Some("1.0.0"), runner);

        let sub = root.submodules().iter().next().unwrap().clone();
        assert_matches!(sub.tag(), Err(crate::error::RepoError::Tool(_)));
    }

    #[test]
    fn test_non_zero_exit_is_empty() {
        let root = RepoHandle::root("/srv/repo", Some("1.0.0"), Rc::new(ScriptedRunner::new()));
        assert!(root.git(&["cat-file", "blob", "1.0.0:missing"]).unwrap().is_empty());
    }

    #[test]
    fn test_gitlink_commit_parsing() {
        assert_eq!(
            gitlink_commit(format!("160000 commit {SUB_SHA}\tlib/sub\n").as_bytes()),
            Some(SUB_SHA.to_string())
        );
        assert_eq!(gitlink_commit(b""), None);
        assert_eq!(gitlink_commit(b"160000 commit"), None);
    }
}
