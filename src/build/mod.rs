//! Compiler invocation
//!
//! Assembles one compile command line in a fixed order and hands it to
//! `sh -c`, so user flag strings are split the way a shell would split
//! them. The compiler's exit code is reported verbatim and never retried.

pub mod shebang;

use crate::error::{CsError, CsResult};
use crate::process::ProcessRunner;
use std::path::{Path, PathBuf};
use tracing::info;

/// Header shipped next to the `cs` binary for compiled scripts
const HEADER_NAME: &str = "cs.h";

/// Inputs for one compile
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Compiler command
    pub toolchain: String,
    /// Directory containing `cs.h`, if found
    pub include_dir: Option<PathBuf>,
    /// Compiler flag strings
    pub cflags: Vec<String>,
    /// Source file as given by the user
    pub source: PathBuf,
    /// Artifact output path
    pub output: PathBuf,
    /// Linker flag strings
    pub ldflags: Vec<String>,
}

/// Quote `value` for a POSIX shell
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Render the compile command line.
///
/// Order: toolchain, include dir, cflags, input, output, ldflags. When
/// `force_c` is set the input is wrapped in `-x c ... -x none` so a scratch
/// file is treated as C and later inputs keep their usual handling.
pub fn command_line(request: &BuildRequest, input: &Path, force_c: bool) -> String {
    let mut parts = vec![request.toolchain.clone()];

    if let Some(dir) = &request.include_dir {
        parts.push(format!("-I{}", shell_quote(&dir.to_string_lossy())));
    }
    parts.extend(request.cflags.iter().cloned());

    if force_c {
        parts.push("-x c".to_string());
    }
    parts.push(shell_quote(&input.to_string_lossy()));
    if force_c {
        parts.push("-x none".to_string());
    }

    parts.push(format!("-o {}", shell_quote(&request.output.to_string_lossy())));
    parts.extend(request.ldflags.iter().cloned());

    parts.join(" ")
}

/// Locate the directory holding `cs.h` relative to the running binary.
///
/// Checks the binary's own directory first, then its parent.
pub fn find_include_dir(exe_dir: &Path) -> Option<PathBuf> {
    if exe_dir.join(HEADER_NAME).is_file() {
        return Some(exe_dir.to_path_buf());
    }
    let parent = exe_dir.join("..");
    if parent.join(HEADER_NAME).is_file() {
        return Some(parent);
    }
    None
}

/// Include directory for the currently running `cs`, if any
pub fn default_include_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    find_include_dir(exe.parent()?)
}

/// Runs compiles through a process runner
pub struct Builder<'a> {
    runner: &'a dyn ProcessRunner,
}

impl<'a> Builder<'a> {
    /// Create a builder using `runner` for the compiler process
    pub fn new(runner: &'a dyn ProcessRunner) -> Self {
        Self { runner }
    }

    /// Compile `request.source` into `request.output`.
    ///
    /// A leading `#!` line is stripped into a scratch file first; the
    /// scratch file is gone by the time this returns.
    pub fn build(&self, request: &BuildRequest) -> CsResult<()> {
        let scratch = shebang::prepare_scratch(&request.source)?;
        let line = match &scratch {
            Some(file) => command_line(request, file.path(), true),
            None => command_line(request, &request.source, false),
        };
        info!("{}", line);

        let code = self
            .runner
            .status("sh", &["-c".to_string(), line])?;
        drop(scratch);

        if code != 0 {
            return Err(CsError::CompileFailed { code });
        }
        Ok(())
    }
}
