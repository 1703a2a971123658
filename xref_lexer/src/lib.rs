// Internal modules
pub mod config;
pub mod lexical;
#[macro_use]
pub mod logging;

// Re-export key types for library consumers
pub use config::{ConfigError, XrefConfig};
pub use lexical::{tokenize, TokenStream, TokenUnit, TokenizerError};
