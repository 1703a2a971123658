//! In-memory runner answering tool invocations from a script

use super::{CommandError, CommandOutput, CommandRunner};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

type Key = (PathBuf, String);

/// Unscripted invocations exit 128 with no output, like git on a bad object
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: HashMap<Key, Result<CommandOutput, String>>,
    calls: RefCell<Vec<(PathBuf, String)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(cwd: &Path, program: &str, args: &[&str]) -> Key {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        (cwd.to_path_buf(), line)
    }

    /// Answer `program args...` run in `cwd` with `stdout` and exit 0
    pub fn on(mut self, cwd: impl AsRef<Path>, command: &str, stdout: &str) -> Self {
        self.responses.insert(
            (cwd.as_ref().to_path_buf(), command.to_string()),
            Ok(CommandOutput {
                stdout: stdout.as_bytes().to_vec(),
                ..Default::default()
            }),
        );
        self
    }

    pub fn on_output(mut self, cwd: impl AsRef<Path>, command: &str, output: CommandOutput) -> Self {
        self.responses
            .insert((cwd.as_ref().to_path_buf(), command.to_string()), Ok(output));
        self
    }

    /// Answer with a timeout error
    pub fn on_timeout(mut self, cwd: impl AsRef<Path>, command: &str) -> Self {
        self.responses.insert(
            (cwd.as_ref().to_path_buf(), command.to_string()),
            Err(command.to_string()),
        );
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, String)> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, command: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(_, line)| line == command)
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError> {
        let key = Self::key(cwd, program, args);
        self.calls.borrow_mut().push(key.clone());

        match self.responses.get(&key) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(_)) => Err(CommandError::Timeout {
                program: program.to_string(),
                timeout_ms: timeout.map(|t| t.as_millis() as u64).unwrap_or(0),
            }),
            None => Ok(CommandOutput {
                exit_code: 128,
                ..Default::default()
            }),
        }
    }
}

/// Scratch storage with a root repository at `repo/` and nested ones under
/// `submodules/<mount>`
pub(crate) fn storage_layout(mounts: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("repo/refs")).unwrap();
    for mount in mounts {
        std::fs::create_dir_all(dir.path().join("submodules").join(mount).join("refs")).unwrap();
    }
    dir
}
