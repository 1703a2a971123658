//! External tool execution
//!
//! Every `git`, `ctags` and fallthrough-script invocation goes through a
//! [`CommandRunner`]; production code uses [`SystemCommandExecutor`].

pub mod executor;
pub mod profile;

#[cfg(test)]
pub(crate) mod scripted;

pub use executor::{CommandError, CommandOutput, CommandRunner, SystemCommandExecutor};
pub use profile::{create_xref_command_executor, CTAGS, EXTERNAL_SCRIPT, GIT};
