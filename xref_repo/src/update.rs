//! Refreshing the root and nested repositories

use crate::error::{RepoError, RepoResult};
use crate::repository::RepoHandle;
use std::io::Write;
use std::rc::Rc;
use std::time::{Duration, Instant};
use xref_lexer::logging::codes;
use xref_lexer::{log_performance, log_warning};

const FETCH_ARGS: &[&str] = &["fetch", "-f", "--prune", "--progress"];

/// Print every repository path, fetching each one first when asked
///
/// Fetch output (progress included) is passed through as it comes back from
/// git, whether or not the fetch succeeded.
pub fn update(
    root: &Rc<RepoHandle>,
    fetch: bool,
    fetch_timeout: Duration,
    out: &mut dyn Write,
) -> RepoResult<()> {
    let start = Instant::now();
    let mut repos = 0usize;

    for repo in std::iter::once(root).chain(root.submodules().iter()) {
        repos += 1;
        let write_err = |e: std::io::Error| RepoError::io(repo.path(), e);

        write!(out, "{}\n\n", repo.path().display()).map_err(write_err)?;

        if fetch {
            let output = repo.run_git(FETCH_ARGS, Some(fetch_timeout))?;
            if !output.success() {
                log_warning!(code = codes::tool::NON_ZERO_EXIT, "Fetch failed",
                    "repo" => repo.path().display(),
                    "exit_code" => output.exit_code
                );
            }
            out.write_all(&output.stdout).map_err(write_err)?;
            out.write_all(&output.stderr).map_err(write_err)?;
        }
        out.flush().map_err(write_err)?;
    }

    log_performance!(codes::success::UPDATE_COMPLETE, "Repositories updated",
        duration = start.elapsed(),
        "repos" => repos,
        "fetch" => fetch
    );
    Ok(())
}
