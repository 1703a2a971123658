//! Consolidated log codes and classification system
//!
//! Single source of truth for every code emitted by the xref backend, together
//! with the behavioral metadata used when formatting and classifying events.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Configuration error codes
pub mod config {
    use super::Code;

    pub const MISSING_REPO_DIR: Code = Code::new("E005");
    pub const INVALID_VALUE: Code = Code::new("E006");
    pub const CONFIG_FILE_ERROR: Code = Code::new("E007");
}

/// External tool invocation codes
pub mod tool {
    use super::Code;

    pub const PROGRAM_NOT_FOUND: Code = Code::new("E020");
    pub const PERMISSION_DENIED: Code = Code::new("E021");
    pub const EXECUTION_FAILED: Code = Code::new("E022");
    pub const TIMEOUT: Code = Code::new("E023");
    pub const SECURITY_VIOLATION: Code = Code::new("E024");
    pub const NON_ZERO_EXIT: Code = Code::new("E025");
}

/// Repository resolution codes
pub mod resolution {
    use super::Code;

    pub const TAG_UNRESOLVED: Code = Code::new("E040");
    pub const PATH_NOT_FOUND: Code = Code::new("E041");
    pub const SUBMODULE_SCAN_FAILED: Code = Code::new("E042");
    pub const PATH_OUTSIDE_MOUNT: Code = Code::new("E043");
    pub const MALFORMED_TOOL_OUTPUT: Code = Code::new("E044");
}

/// Version catalog codes
pub mod catalog {
    use super::Code;

    pub const EMPTY_CATALOG: Code = Code::new("E060");
}

/// Tokenizer codes
pub mod lexical {
    use super::Code;

    pub const INPUT_TOO_LARGE: Code = Code::new("E080");
}

/// Command surface codes
pub mod command {
    use super::Code;

    pub const INVALID_ARGUMENTS: Code = Code::new("E100");
    pub const OUTPUT_FAILURE: Code = Code::new("E101");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const QUERY_COMPLETED: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const SUBMODULE_DISCOVERY_COMPLETE: Code = Code::new("I040");
    pub const TAG_RESOLVED: Code = Code::new("I041");
    pub const CATALOG_BUILT: Code = Code::new("I060");
    pub const UPDATE_COMPLETE: Code = Code::new("I070");
    pub const DEFINITIONS_EXTRACTED: Code = Code::new("I080");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal system error",
                "File a bug report with the failing command line",
            ),
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "Logging or runtime initialization failed",
                "Check that the process is only initialized once",
            ),
            ErrorMetadata::new(
                "E005",
                "Configuration",
                Severity::Critical,
                false,
                true,
                "The root repository location is not configured",
                "Set LXR_REPO_DIR to the root repository storage directory",
            ),
            ErrorMetadata::new(
                "E006",
                "Configuration",
                Severity::High,
                false,
                true,
                "A configuration value could not be parsed",
                "Fix the offending environment variable or config file entry",
            ),
            ErrorMetadata::new(
                "E007",
                "Configuration",
                Severity::High,
                false,
                true,
                "The configuration file could not be read or parsed",
                "Check the path named by XREF_CONFIG and its TOML syntax",
            ),
            ErrorMetadata::new(
                "E020",
                "Tool",
                Severity::Critical,
                false,
                true,
                "External program not found",
                "Install the program or widen XREF_TOOL_PATH",
            ),
            ErrorMetadata::new(
                "E021",
                "Tool",
                Severity::High,
                false,
                true,
                "Permission denied while starting an external program",
                "Check file permissions of the program and repository",
            ),
            ErrorMetadata::new(
                "E022",
                "Tool",
                Severity::High,
                false,
                true,
                "External program could not be executed",
                "Inspect the error reason and the repository state",
            ),
            ErrorMetadata::new(
                "E023",
                "Tool",
                Severity::High,
                false,
                true,
                "External program exceeded its timeout and was killed",
                "Raise XREF_TOOL_TIMEOUT_SECS or investigate the repository",
            ),
            ErrorMetadata::new(
                "E024",
                "Tool",
                Severity::Critical,
                false,
                true,
                "Program is not in the executor whitelist",
                "Only whitelisted programs may be invoked",
            ),
            ErrorMetadata::new(
                "E025",
                "Tool",
                Severity::Low,
                true,
                false,
                "External program exited with a non-zero status",
                "Treated as no data; inspect stderr if unexpected",
            ),
            ErrorMetadata::new(
                "E040",
                "Resolution",
                Severity::Low,
                true,
                false,
                "Submodule commit could not be found in the parent tree",
                "The submodule did not exist at the requested version",
            ),
            ErrorMetadata::new(
                "E041",
                "Resolution",
                Severity::Low,
                true,
                false,
                "Path not found in the repository or any submodule",
                "Check the version and path of the query",
            ),
            ErrorMetadata::new(
                "E042",
                "Resolution",
                Severity::Medium,
                true,
                false,
                "Submodule storage directory could not be scanned",
                "Check permissions of the submodules directory",
            ),
            ErrorMetadata::new(
                "E043",
                "Resolution",
                Severity::Low,
                true,
                false,
                "Path matched a submodule prefix but lies outside its mount point",
                "Mount points sharing a string prefix are ambiguous",
            ),
            ErrorMetadata::new(
                "E044",
                "Resolution",
                Severity::Medium,
                true,
                false,
                "Version control output line could not be parsed",
                "Check the installed git version",
            ),
            ErrorMetadata::new(
                "E060",
                "Catalog",
                Severity::High,
                false,
                true,
                "No version tags found in the root repository",
                "Fetch tags with `update fetch` or check LXR_REPO_DIR",
            ),
            ErrorMetadata::new(
                "E080",
                "Lexical",
                Severity::High,
                true,
                false,
                "Source input exceeds the tokenizer size limit",
                "The file is too large to be tokenized",
            ),
            ErrorMetadata::new(
                "E100",
                "Command",
                Severity::High,
                false,
                true,
                "Command arguments are missing or invalid",
                "Run with --help for the command table",
            ),
            ErrorMetadata::new(
                "E101",
                "Command",
                Severity::High,
                false,
                true,
                "Writing command output failed",
                "Check the consumer of standard output",
            ),
            ErrorMetadata::new(
                "I001",
                "Command",
                Severity::Low,
                true,
                false,
                "Query completed",
                "None",
            ),
            ErrorMetadata::new(
                "I004",
                "System",
                Severity::Low,
                true,
                false,
                "Logging system initialized",
                "None",
            ),
            ErrorMetadata::new(
                "I020",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Tokenization completed",
                "None",
            ),
            ErrorMetadata::new(
                "I040",
                "Resolution",
                Severity::Low,
                true,
                false,
                "Submodule discovery completed",
                "None",
            ),
            ErrorMetadata::new(
                "I041",
                "Resolution",
                Severity::Low,
                true,
                false,
                "Submodule commit resolved from the parent tree",
                "None",
            ),
            ErrorMetadata::new(
                "I060",
                "Catalog",
                Severity::Low,
                true,
                false,
                "Version catalog built",
                "None",
            ),
            ErrorMetadata::new(
                "I070",
                "Update",
                Severity::Low,
                true,
                false,
                "Repository update completed",
                "None",
            ),
            ErrorMetadata::new(
                "I080",
                "Definitions",
                Severity::Low,
                true,
                false,
                "Definitions extracted from blob",
                "None",
            ),
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Check if error requires immediate halt
pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

/// Get human-readable description for code
pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

/// Get recommended action for code
pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

/// Get category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_constant_has_metadata() {
        let all = [
            system::INTERNAL_ERROR,
            system::INITIALIZATION_FAILURE,
            config::MISSING_REPO_DIR,
            config::INVALID_VALUE,
            config::CONFIG_FILE_ERROR,
            tool::PROGRAM_NOT_FOUND,
            tool::PERMISSION_DENIED,
            tool::EXECUTION_FAILED,
            tool::TIMEOUT,
            tool::SECURITY_VIOLATION,
            tool::NON_ZERO_EXIT,
            resolution::TAG_UNRESOLVED,
            resolution::PATH_NOT_FOUND,
            resolution::SUBMODULE_SCAN_FAILED,
            resolution::PATH_OUTSIDE_MOUNT,
            resolution::MALFORMED_TOOL_OUTPUT,
            catalog::EMPTY_CATALOG,
            lexical::INPUT_TOO_LARGE,
            command::INVALID_ARGUMENTS,
            command::OUTPUT_FAILURE,
            success::QUERY_COMPLETED,
            success::SYSTEM_INITIALIZATION_COMPLETED,
            success::TOKENIZATION_COMPLETE,
            success::SUBMODULE_DISCOVERY_COMPLETE,
            success::TAG_RESOLVED,
            success::CATALOG_BUILT,
            success::UPDATE_COMPLETE,
            success::DEFINITIONS_EXTRACTED,
        ];

        for code in all {
            assert!(
                get_error_metadata(code.as_str()).is_some(),
                "missing metadata for {}",
                code
            );
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(get_category("E023"), "Tool");
        assert_eq!(get_severity("E005"), Severity::Critical);
        assert!(requires_halt("E005"));
        assert!(is_recoverable("E041"));
        assert!(!requires_halt("E041"));
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("Z999"), "Unknown error");
        assert_eq!(get_category("Z999"), "Unknown");
        assert_eq!(get_severity("Z999"), Severity::Medium);
        assert!(is_recoverable("Z999"));
    }
}
