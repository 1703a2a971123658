//! # Query Engine
//!
//! One entry point per command of the cross-reference backend. Every query
//! opens a fresh root handle, so resolved tags and the nested repository
//! index never outlive the request that produced them.

use crate::defs::extract_definitions;
use crate::error::{RepoError, RepoResult};
use crate::repository::{RepoHandle, RepoPath, VersionCatalog};
use crate::resolve::{self, ListMode};
use crate::tools::{create_xref_command_executor, CommandRunner, EXTERNAL_SCRIPT};
use crate::update;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use xref_lexer::config::{ToolPreferences, XrefConfig};
use xref_lexer::logging::codes;
use xref_lexer::{log_warning, tokenize};

pub struct QueryEngine {
    repo_dir: PathBuf,
    tools: ToolPreferences,
    runner: Rc<dyn CommandRunner>,
}

impl QueryEngine {
    /// Engine backed by the whitelisted system executor
    pub fn new(config: &XrefConfig) -> Self {
        let executor = create_xref_command_executor(&config.tools);
        Self::with_runner(&config.repo_dir, config.tools.clone(), Rc::new(executor))
    }

    pub fn with_runner(
        repo_dir: impl Into<PathBuf>,
        tools: ToolPreferences,
        runner: Rc<dyn CommandRunner>,
    ) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            tools,
            runner,
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn open(&self, version: Option<&str>) -> Rc<RepoHandle> {
        RepoHandle::root(&self.repo_dir, version, Rc::clone(&self.runner))
    }

    pub fn catalog(&self) -> RepoResult<VersionCatalog> {
        VersionCatalog::load(&self.open(None))
    }

    /// `list-tags [-h]`
    pub fn list_tags(&self, annotated: bool) -> RepoResult<Vec<u8>> {
        let catalog = self.catalog()?;
        Ok(if annotated {
            catalog.render_annotated()
        } else {
            catalog.render_plain()
        })
    }

    /// `get-latest`
    pub fn get_latest(&self) -> RepoResult<Vec<u8>> {
        let catalog = self.catalog()?;
        Ok(format!("{}\n", catalog.latest()?).into_bytes())
    }

    /// `get-type <version> <path>`
    pub fn get_type(&self, version: &str, path: &str) -> RepoResult<Vec<u8>> {
        resolve::get_type(&self.open(Some(version)), &RepoPath::new(path))
    }

    /// `get-blob <object-id>`
    pub fn get_blob(&self, object_id: &str) -> RepoResult<Vec<u8>> {
        resolve::get_blob_by_object_id(&self.open(None), object_id)
    }

    /// `get-file <version> <path>`
    pub fn get_file(&self, version: &str, path: &str) -> RepoResult<Vec<u8>> {
        resolve::get_blob(&self.open(Some(version)), &RepoPath::new(path))
    }

    /// `get-dir <version> <path>`
    pub fn get_dir(&self, version: &str, path: &str) -> RepoResult<Vec<u8>> {
        let entries = resolve::list_directory(&self.open(Some(version)), &RepoPath::new(path))?;
        Ok(resolve::render_listing(&entries))
    }

    /// `list-blobs <-p|-f> <version>`; an unknown flag lists nothing
    pub fn list_blobs(&self, flag: &str, version: &str) -> RepoResult<Vec<u8>> {
        let Some(mode) = ListMode::from_flag(flag) else {
            log_warning!(code = codes::command::INVALID_ARGUMENTS, "Unknown list-blobs mode",
                "flag" => flag
            );
            return Ok(Vec::new());
        };
        resolve::list_blobs(&self.open(Some(version)), mode)
    }

    /// `tokenize-file <version> <path>`
    pub fn tokenize_file(&self, version: &str, path: &str) -> RepoResult<Vec<u8>> {
        let content = self.get_file(version, path)?;
        self.tokenize_content(&content)
    }

    /// `tokenize-file -b <object-id>`
    pub fn tokenize_blob(&self, object_id: &str) -> RepoResult<Vec<u8>> {
        let content = self.get_blob(object_id)?;
        self.tokenize_content(&content)
    }

    fn tokenize_content(&self, content: &[u8]) -> RepoResult<Vec<u8>> {
        if content.is_empty() {
            return Ok(Vec::new());
        }
        Ok(tokenize(content)?.encode())
    }

    /// `parse-defs <object-id> <filename>`
    pub fn parse_defs(&self, object_id: &str, filename: &str) -> RepoResult<Vec<u8>> {
        let content = self.get_blob(object_id)?;
        extract_definitions(self.runner.as_ref(), &content, filename)
    }

    /// `update [fetch]`; progress goes straight to `out`
    pub fn update(&self, fetch: bool, out: &mut dyn Write) -> RepoResult<()> {
        update::update(
            &self.open(None),
            fetch,
            Duration::from_secs(self.tools.fetch_timeout_secs),
            out,
        )
    }

    /// Hand a command outside the fixed table to `./script.sh`
    ///
    /// The script runs from the current directory and its stdout is returned
    /// whatever its exit status.
    pub fn external(&self, command: &str, args: &[String]) -> RepoResult<Vec<u8>> {
        let cwd = std::env::current_dir().map_err(|e| RepoError::io(".", e))?;
        let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 1);
        argv.push(command);
        argv.extend(args.iter().map(String::as_str));

        let output = self.runner.run(EXTERNAL_SCRIPT, &argv, &cwd, None)?;
        if !output.success() {
            log_warning!(code = codes::tool::NON_ZERO_EXIT, "External command failed",
                "command" => command,
                "exit_code" => output.exit_code
            );
        }
        Ok(output.stdout)
    }
}
