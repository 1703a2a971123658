//! External program execution with a whitelist and timeout enforcement

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use xref_lexer::config::compile_time::tools::{DEFAULT_TOOL_PATH, DEFAULT_TOOL_TIMEOUT_SECS};
use xref_lexer::logging::codes;
use xref_lexer::{log_debug, log_error};

/// Seam between resolution logic and the processes it runs
pub trait CommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError>;
}

/// Runs whitelisted programs in a cleared environment
#[derive(Clone)]
pub struct SystemCommandExecutor {
    default_timeout: Duration,
    allowed_commands: HashSet<String>,
    search_path: String,
    preserved_env: Vec<String>,
    preserved_prefixes: Vec<String>,
}

impl SystemCommandExecutor {
    /// Create executor with empty whitelist - must be configured before use
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            default_timeout: timeout,
            allowed_commands: HashSet::new(),
            search_path: DEFAULT_TOOL_PATH.to_string(),
            preserved_env: Vec::new(),
            preserved_prefixes: Vec::new(),
        }
    }

    pub fn set_search_path(&mut self, search_path: impl Into<String>) {
        self.search_path = search_path.into();
    }

    /// Variables copied from this process into every child
    pub fn preserve_env(&mut self, names: &[&str]) {
        self.preserved_env
            .extend(names.iter().map(|name| name.to_string()));
    }

    /// Every variable whose name starts with `prefix` is copied as well
    pub fn preserve_env_prefix(&mut self, prefix: impl Into<String>) {
        self.preserved_prefixes.push(prefix.into());
    }

    pub fn allow_command(&mut self, command: impl Into<String>) {
        self.allowed_commands.insert(command.into());
    }

    pub fn allow_commands(&mut self, commands: &[&str]) {
        for cmd in commands {
            self.allowed_commands.insert(cmd.to_string());
        }
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed_commands.contains(command)
    }

    /// Whether the variable `name` reaches child processes
    pub fn is_preserved(&self, name: &str) -> bool {
        self.preserved_env.iter().any(|kept| kept == name)
            || self
                .preserved_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()))
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Execute program with timeout and capture output
    pub fn execute(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError> {
        if !self.is_allowed(program) {
            let error = CommandError::SecurityViolation {
                reason: format!("Command '{}' not in whitelist", program),
            };
            log_error!(error.error_code(), "Refused to run program", "program" => program);
            return Err(error);
        }

        let timeout_duration = timeout.unwrap_or(self.default_timeout);
        let start = Instant::now();

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .env_clear()
            .env("PATH", &self.search_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for name in &self.preserved_env {
            if let Some(value) = std::env::var_os(name) {
                cmd.env(name, value);
            }
        }
        if !self.preserved_prefixes.is_empty() {
            for (name, value) in std::env::vars_os() {
                if name.to_str().is_some_and(|name| self.is_preserved(name)) {
                    cmd.env(name, value);
                }
            }
        }

        let mut child = cmd.spawn().map_err(|e| {
            let error = match e.kind() {
                std::io::ErrorKind::NotFound => CommandError::ProgramNotFound {
                    program: program.to_string(),
                },
                std::io::ErrorKind::PermissionDenied => CommandError::PermissionDenied {
                    program: program.to_string(),
                },
                _ => CommandError::ExecutionFailed {
                    program: program.to_string(),
                    reason: e.to_string(),
                },
            };
            log_error!(error.error_code(), "Failed to start program",
                "program" => program,
                "cwd" => cwd.display(),
                "reason" => e
            );
            error
        })?;

        // Drain both pipes while waiting; a child blocked on a full pipe
        // would otherwise never exit.
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());
        let deadline = start + timeout_duration;

        let waited = wait_timeout::ChildExt::wait_timeout(&mut child, timeout_duration);
        let status = match waited {
            Ok(Some(status)) => status,
            Ok(None) => {
                // Readers are dropped unjoined: a grandchild may still hold
                // the pipes open after the child is gone.
                kill(&mut child);
                return Err(timed_out(program, cwd, timeout_duration));
            }
            Err(e) => {
                kill(&mut child);
                return Err(CommandError::ExecutionFailed {
                    program: program.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let stdout = collect(stdout_reader, deadline)
            .map_err(|failure| failure.into_error(program, cwd, timeout_duration))?;
        let stderr = collect(stderr_reader, deadline)
            .map_err(|failure| failure.into_error(program, cwd, timeout_duration))?;

        let output = CommandOutput {
            stdout,
            stderr,
            exit_code: status.code().unwrap_or(-1),
            duration: start.elapsed(),
        };

        log_debug!("Program finished",
            "program" => program,
            "args" => args.join(" "),
            "exit_code" => output.exit_code,
            "stdout_bytes" => output.stdout.len(),
            "duration_ms" => output.duration.as_millis()
        );

        Ok(output)
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemCommandExecutor {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError> {
        self.execute(program, args, cwd, timeout)
    }
}

type Reader = Option<Receiver<std::io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    pipe.map(|mut pipe| {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let result = pipe.read_to_end(&mut buffer).map(|_| buffer);
            let _ = sender.send(result);
        });
        receiver
    })
}

enum ReadFailure {
    Io(String),
    /// Pipe still open at the deadline, held by a process the child started
    HeldOpen,
}

impl ReadFailure {
    fn into_error(self, program: &str, cwd: &Path, timeout: Duration) -> CommandError {
        match self {
            ReadFailure::Io(reason) => CommandError::ExecutionFailed {
                program: program.to_string(),
                reason,
            },
            ReadFailure::HeldOpen => timed_out(program, cwd, timeout),
        }
    }
}

fn collect(reader: Reader, deadline: Instant) -> Result<Vec<u8>, ReadFailure> {
    let Some(receiver) = reader else {
        return Ok(Vec::new());
    };
    let remaining = deadline.saturating_duration_since(Instant::now());
    match receiver.recv_timeout(remaining) {
        Ok(Ok(buffer)) => Ok(buffer),
        Ok(Err(e)) => Err(ReadFailure::Io(e.to_string())),
        Err(RecvTimeoutError::Timeout) => Err(ReadFailure::HeldOpen),
        Err(RecvTimeoutError::Disconnected) => {
            Err(ReadFailure::Io("output reader panicked".to_string()))
        }
    }
}

fn timed_out(program: &str, cwd: &Path, timeout: Duration) -> CommandError {
    let error = CommandError::Timeout {
        program: program.to_string(),
        timeout_ms: timeout.as_millis() as u64,
    };
    log_error!(error.error_code(), "Program timed out",
        "program" => program,
        "cwd" => cwd.display(),
        "timeout_ms" => timeout.as_millis()
    );
    error
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Command execution output
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Command execution errors
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Program not found: {program}")]
    ProgramNotFound { program: String },

    #[error("Execution failed for '{program}': {reason}")]
    ExecutionFailed { program: String, reason: String },

    #[error("'{program}' timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },

    #[error("Permission denied: {program}")]
    PermissionDenied { program: String },

    #[error("Security violation: {reason}")]
    SecurityViolation { reason: String },
}

impl CommandError {
    pub fn error_code(&self) -> xref_lexer::logging::Code {
        match self {
            CommandError::ProgramNotFound { .. } => codes::tool::PROGRAM_NOT_FOUND,
            CommandError::ExecutionFailed { .. } => codes::tool::EXECUTION_FAILED,
            CommandError::Timeout { .. } => codes::tool::TIMEOUT,
            CommandError::PermissionDenied { .. } => codes::tool::PERMISSION_DENIED,
            CommandError::SecurityViolation { .. } => codes::tool::SECURITY_VIOLATION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn shell_executor() -> SystemCommandExecutor {
        let mut executor = SystemCommandExecutor::with_timeout(Duration::from_secs(10));
        executor.allow_commands(&["sh"]);
        executor
    }

    #[test]
    fn test_empty_whitelist() {
        let executor = SystemCommandExecutor::new();
        assert!(!executor.is_allowed("git"));
        assert!(!executor.is_allowed("ctags"));
    }

    #[test]
    fn test_whitelist_management() {
        let mut executor = SystemCommandExecutor::new();

        executor.allow_command("git");
        assert!(executor.is_allowed("git"));
        assert!(!executor.is_allowed("ctags"));

        executor.allow_commands(&["ctags", "./script.sh"]);
        assert!(executor.is_allowed("ctags"));
        assert!(executor.is_allowed("./script.sh"));
    }

    #[test]
    fn test_security_violation() {
        let executor = SystemCommandExecutor::new();
        let result = executor.execute("rm", &["-rf", "/"], Path::new("."), None);

        assert_matches!(result, Err(CommandError::SecurityViolation { .. }));
    }

    #[test]
    fn test_missing_program() {
        let mut executor = SystemCommandExecutor::new();
        executor.allow_command("definitely-not-a-real-program-xref");

        let result = executor.execute(
            "definitely-not-a-real-program-xref",
            &[],
            Path::new("."),
            None,
        );
        assert_matches!(result, Err(CommandError::ProgramNotFound { .. }));
    }

    #[test]
    fn test_captures_output_and_exit_code() {
        let executor = shell_executor();
        let output = executor
            .execute("sh", &["-c", "printf 'out'; printf 'err' >&2; exit 3"], Path::new("."), None)
            .unwrap();

        assert_eq!(output.stdout, b"out".to_vec());
        assert_eq!(output.stderr, b"err".to_vec());
        assert_eq!(output.exit_code, 3);
        assert!(!output.success());
    }

    #[test]
    fn test_large_output_does_not_block() {
        let executor = shell_executor();
        let output = executor
            .execute(
                "sh",
                &["-c", "i=0; while [ $i -lt 20000 ]; do echo 0123456789; i=$((i+1)); done"],
                Path::new("."),
                None,
            )
            .unwrap();

        assert_eq!(output.stdout.len(), 20000 * 11);
        assert!(output.success());
    }

    #[test]
    fn test_environment_is_cleared_except_preserved() {
        std::env::set_var("XREF_EXECUTOR_TEST_DROPPED", "leak");
        std::env::set_var("XREF_EXECUTOR_TEST_KEPT", "kept");

        let mut executor = shell_executor();
        executor.preserve_env(&["XREF_EXECUTOR_TEST_KEPT"]);
        let output = executor
            .execute(
                "sh",
                &[
                    "-c",
                    "printf '%s %s' \"${XREF_EXECUTOR_TEST_DROPPED:-unset}\" \"$XREF_EXECUTOR_TEST_KEPT\"",
                ],
                Path::new("."),
                None,
            )
            .unwrap();

        assert_eq!(output.stdout, b"unset kept".to_vec());
    }

    #[test]
    fn test_preserved_prefix_passes_matching_variables() {
        std::env::set_var("XREF_PREFIX_TEST_SITE", "mirror");
        std::env::set_var("XREFPREFIXTEST_OTHER", "leak");

        let mut executor = shell_executor();
        executor.preserve_env_prefix("XREF_PREFIX_TEST_");
        let output = executor
            .execute(
                "sh",
                &[
                    "-c",
                    "printf '%s %s' \"$XREF_PREFIX_TEST_SITE\" \"${XREFPREFIXTEST_OTHER:-unset}\"",
                ],
                Path::new("."),
                None,
            )
            .unwrap();

        assert_eq!(output.stdout, b"mirror unset".to_vec());
    }

    #[test]
    fn test_timeout_kills_child() {
        let executor = shell_executor();
        let result = executor.execute(
            "sh",
            &["-c", "exec sleep 5"],
            Path::new("."),
            Some(Duration::from_millis(100)),
        );

        assert_matches!(result, Err(CommandError::Timeout { timeout_ms: 100, .. }));
    }

    #[test]
    fn test_timeout_does_not_wait_for_grandchildren() {
        let executor = shell_executor();
        let start = Instant::now();
        let result = executor.execute(
            "sh",
            &["-c", "sleep 4; echo done"],
            Path::new("."),
            Some(Duration::from_millis(200)),
        );

        assert_matches!(result, Err(CommandError::Timeout { timeout_ms: 200, .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_background_process_holding_output_times_out() {
        let executor = shell_executor();
        let start = Instant::now();
        let result = executor.execute(
            "sh",
            &["-c", "sleep 4 & echo started"],
            Path::new("."),
            Some(Duration::from_millis(300)),
        );

        assert_matches!(result, Err(CommandError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), b"here").unwrap();

        let executor = shell_executor();
        let output = executor
            .execute("sh", &["-c", "cat marker"], dir.path(), None)
            .unwrap();
        assert_eq!(output.stdout, b"here".to_vec());
    }
}
