pub mod compile_time {
    pub mod lexical {
        /// Maximum source size accepted by the tokenizer (64MB)
        /// SECURITY: Bounds memory for a single tokenize request
        pub const MAX_SOURCE_SIZE: usize = 64 * 1024 * 1024;

        /// Byte substituted for line feeds inside separator runs
        pub const LINE_SENTINEL: u8 = 0x01;
    }

    pub mod repository {
        /// Directory next to the root storage holding nested repositories
        pub const SUBMODULES_DIR: &str = "submodules";

        /// Entry name marking a directory as repository storage
        pub const REPOSITORY_MARKER: &str = "refs";

        /// Storage subdirectories never descended into during discovery
        /// PERFORMANCE: object stores can hold millions of entries
        pub const SKIPPED_STORAGE_DIRS: &[&str] = &["objects", "logs", "refs"];

        /// Maximum directory depth scanned under the submodules directory
        /// SECURITY: Prevents unbounded traversal via symlink loops
        pub const MAX_DISCOVERY_DEPTH: usize = 32;

        /// Number of components in a release version
        pub const RELEASE_COMPONENTS: usize = 3;
    }

    pub mod tools {
        /// Default timeout for read-only version control queries
        pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;

        /// Default timeout for `update fetch`
        pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 900;

        /// Upper bound accepted for any configured timeout
        /// SECURITY: A hung tool must never pin the process forever
        pub const MAX_TOOL_TIMEOUT_SECS: u64 = 24 * 60 * 60;

        /// PATH handed to child processes when none is configured
        pub const DEFAULT_TOOL_PATH: &str = "/usr/local/bin:/usr/bin:/bin";
    }

    pub mod logging {
        /// Maximum events retained by the in-memory logger
        /// RESOURCE: Controls memory usage for captured events
        pub const LOG_BUFFER_SIZE: usize = 10_000;

        /// Maximum log message length before truncation
        pub const MAX_LOG_MESSAGE_LENGTH: usize = 4_096;
    }
}
