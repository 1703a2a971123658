//! Definition extraction with ctags

use crate::error::{RepoError, RepoResult};
use crate::tools::{CommandRunner, CTAGS};
use std::fs;
use std::path::Path;
use std::time::Instant;
use xref_lexer::logging::codes;
use xref_lexer::{log_performance, log_warning};

/// File name used when the requested one has no usable final component
const FALLBACK_NAME: &str = "blob";

/// Run ctags over `content` saved under `filename` and return one
/// `<name> <kind> <line>` row per definition
///
/// Only the last component of `filename` is used, so the blob is always
/// written inside the scratch directory. ctags picks the language from the
/// extension.
pub fn extract_definitions(
    runner: &dyn CommandRunner,
    content: &[u8],
    filename: &str,
) -> RepoResult<Vec<u8>> {
    if content.is_empty() {
        return Ok(Vec::new());
    }
    let start = Instant::now();

    let scratch = tempfile::tempdir().map_err(|e| RepoError::io(std::env::temp_dir(), e))?;
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(FALLBACK_NAME);
    let source = scratch.path().join(name);
    fs::write(&source, content).map_err(|e| RepoError::io(&source, e))?;

    let output = runner.run(CTAGS, &["-x", "--c-kinds=+p-m", name], scratch.path(), None)?;
    if !output.success() {
        log_warning!(code = codes::tool::NON_ZERO_EXIT, "ctags reported failure",
            "exit_code" => output.exit_code,
            "file" => name
        );
    }

    let rows = definition_rows(&output.stdout);
    log_performance!(codes::success::DEFINITIONS_EXTRACTED, "Definitions extracted",
        duration = start.elapsed(),
        "file" => name,
        "bytes" => rows.len()
    );
    Ok(rows)
}

/// Keep the first three fields of each cross-reference line
fn definition_rows(xref: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(xref.len() / 2);
    for line in xref.split(|&b| b == b'\n') {
        if line.starts_with(b"operator ") {
            continue;
        }
        let fields: Vec<&[u8]> = line
            .split(|b| b.is_ascii_whitespace())
            .filter(|f| !f.is_empty())
            .take(3)
            .collect();
        if fields.is_empty() {
            continue;
        }
        out.extend_from_slice(&fields.join(&b' '));
        out.push(b'\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{CommandError, CommandOutput};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::time::Duration;

    /// Answers like `ctags -x` after checking the file it was handed
    struct FakeCtags {
        seen: RefCell<Vec<(PathBuf, String, Vec<u8>)>>,
        table: &'static str,
    }

    impl CommandRunner for FakeCtags {
        fn run(
            &self,
            program: &str,
            args: &[&str],
            cwd: &Path,
            _timeout: Option<Duration>,
        ) -> Result<CommandOutput, CommandError> {
            assert_eq!(program, "ctags");
            assert_eq!(&args[..2], &["-x", "--c-kinds=+p-m"]);
            let written = fs::read(cwd.join(args[2])).unwrap();
            self.seen
                .borrow_mut()
                .push((cwd.to_path_buf(), args[2].to_string(), written));
            Ok(CommandOutput {
                stdout: self.table.as_bytes().to_vec(),
                ..Default::default()
            })
        }
    }

    fn fake(table: &'static str) -> FakeCtags {
        FakeCtags {
            seen: RefCell::new(Vec::new()),
            table,
        }
    }

    #[test]
    fn test_rows_keep_three_fields() {
        let ctags = fake(
            "mp_obj_new_int   function     42 py/obj.c         mp_obj_t mp_obj_new_int(mp_int_t value) {\n\
             MP_OBJ_NULL      macro        12 py/obj.h         #define MP_OBJ_NULL (0)\n\
             operator ==      function     90 py/obj.c         bool operator==(...)\n",
        );

        let rows = extract_definitions(&ctags, b"int x;\n", "obj.c").unwrap();
        assert_eq!(
            rows,
            b"mp_obj_new_int function 42\nMP_OBJ_NULL macro 12\n".to_vec()
        );
    }

    #[test]
    fn test_blob_written_under_final_name_component() {
        let ctags = fake("");
        extract_definitions(&ctags, b"void f(void);\n", "../../etc/passwd.h").unwrap();

        let seen = ctags.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, "passwd.h");
        assert_eq!(seen[0].2, b"void f(void);\n".to_vec());
        assert!(!seen[0].0.exists());
    }

    #[test]
    fn test_unusable_name_falls_back() {
        let ctags = fake("");
        extract_definitions(&ctags, b"x", "..").unwrap();
        assert_eq!(ctags.seen.borrow()[0].1, FALLBACK_NAME);
    }

    #[test]
    fn test_empty_blob_runs_nothing() {
        let ctags = fake("unused function 1 x.c\n");
        assert!(extract_definitions(&ctags, b"", "x.c").unwrap().is_empty());
        assert!(ctags.seen.borrow().is_empty());
    }
}
