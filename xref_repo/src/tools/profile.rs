//! Whitelisted executor for repository queries
//!
//! Provides the one executor configuration the backend needs.

use super::executor::SystemCommandExecutor;
use std::time::Duration;
use xref_lexer::config::{env_vars, ToolPreferences};

/// Version control plumbing
pub const GIT: &str = "git";
/// Definition extraction
pub const CTAGS: &str = "ctags";
/// Handler for commands outside the fixed command table
pub const EXTERNAL_SCRIPT: &str = "./script.sh";

/// Create command executor for cross-reference queries
///
/// Whitelist includes:
/// - git: tags, tree listings, blob contents, fetch
/// - ctags: definition extraction from a single blob
/// - ./script.sh: site-specific fallthrough commands
pub fn create_xref_command_executor(preferences: &ToolPreferences) -> SystemCommandExecutor {
    let mut executor =
        SystemCommandExecutor::with_timeout(Duration::from_secs(preferences.timeout_secs));

    executor.allow_commands(&[GIT, CTAGS, EXTERNAL_SCRIPT]);
    executor.set_search_path(preferences.search_path.clone());
    executor.preserve_env(&["HOME", env_vars::REPO_DIR]);
    executor.preserve_env_prefix(env_vars::SITE_PREFIX);

    executor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preferences() -> ToolPreferences {
        ToolPreferences {
            timeout_secs: 12,
            fetch_timeout_secs: 300,
            search_path: "/opt/git/bin:/usr/bin".to_string(),
        }
    }

    #[test]
    fn test_xref_executor_whitelist() {
        let executor = create_xref_command_executor(&preferences());

        assert!(executor.is_allowed("git"));
        assert!(executor.is_allowed("ctags"));
        assert!(executor.is_allowed("./script.sh"));

        assert!(!executor.is_allowed("perl"));
        assert!(!executor.is_allowed("sh"));
        assert!(!executor.is_allowed("script.sh"));
    }

    #[test]
    fn test_site_variables_are_preserved() {
        let executor = create_xref_command_executor(&preferences());

        assert!(executor.is_preserved("HOME"));
        assert!(executor.is_preserved("LXR_REPO_DIR"));
        assert!(executor.is_preserved("LXR_MIRROR_URL"));
        assert!(!executor.is_preserved("XREF_LOG_LEVEL"));
        assert!(!executor.is_preserved("LD_PRELOAD"));
    }

    #[test]
    fn test_xref_executor_timeout() {
        let executor = create_xref_command_executor(&preferences());
        assert_eq!(executor.default_timeout(), Duration::from_secs(12));
    }
}
