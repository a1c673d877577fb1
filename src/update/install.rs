//! Binary replacement
//!
//! The verified candidate is renamed over the running binary, which is
//! atomic on one filesystem: the path always holds either the old or the
//! new binary. If the rename fails (e.g. across devices) the candidate is
//! copied over the destination instead, which is not atomic for concurrent
//! readers.

use crate::error::{CsError, CsResult};
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tempfile::{NamedTempFile, PersistError};
use tracing::{debug, warn};

/// How the new binary reached its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceMethod {
    /// Atomic rename
    Rename,
    /// Non-atomic byte copy fallback
    Copy,
}

/// Find the running binary.
///
/// Tries the OS-provided path, then `argv0` if it names a path, then a
/// search of `path_var` for `argv0`.
pub fn resolve_self_path(
    os_path: Option<PathBuf>,
    argv0: Option<&str>,
    path_var: Option<&OsStr>,
) -> Option<PathBuf> {
    if let Some(path) = os_path.filter(|p| p.is_file()) {
        return Some(path);
    }

    let argv0 = argv0.filter(|a| !a.is_empty())?;
    if argv0.contains(MAIN_SEPARATOR) || argv0.contains('/') {
        let path = PathBuf::from(argv0);
        return Some(fs::canonicalize(&path).unwrap_or(path));
    }

    env::split_paths(path_var?)
        .map(|dir| dir.join(argv0))
        .find(|candidate| candidate.is_file())
}

/// Locate the running binary for this process
pub fn current_self_path() -> Option<PathBuf> {
    let argv0 = env::args().next();
    let path_var = env::var_os("PATH");
    resolve_self_path(
        env::current_exe().ok(),
        argv0.as_deref(),
        path_var.as_deref(),
    )
}

/// Create a uniquely named temp file for a download.
///
/// Prefers the target's directory so the final rename stays on one
/// filesystem; falls back to the system temp dir.
pub fn create_temp(target: &Path, prefix: &str) -> CsResult<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix);

    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        match builder.tempfile_in(dir) {
            Ok(file) => return Ok(file),
            Err(e) => debug!("Cannot stage in {}: {}", dir.display(), e),
        }
    }
    builder
        .tempfile()
        .map_err(|e| CsError::io("creating temp file", e))
}

/// Mark a file rwxr-xr-x
pub fn make_executable(path: &Path) -> CsResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .map_err(|e| CsError::io(format!("chmod {}", path.display()), e))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Move `candidate` onto `target`
pub fn replace_binary(candidate: NamedTempFile, target: &Path) -> CsResult<ReplaceMethod> {
    replace_with(candidate, target, |file, target| file.persist(target).map(|_| ()))
}

/// Replacement with an injectable rename step
pub(crate) fn replace_with<F>(
    candidate: NamedTempFile,
    target: &Path,
    rename: F,
) -> CsResult<ReplaceMethod>
where
    F: FnOnce(NamedTempFile, &Path) -> Result<(), PersistError>,
{
    let PersistError { error, file } = match rename(candidate, target) {
        Ok(()) => return Ok(ReplaceMethod::Rename),
        Err(e) => e,
    };
    warn!(
        "Rename onto {} failed ({}), copying instead",
        target.display(),
        error
    );

    let copy_failed = |source| CsError::ReplaceFailed {
        path: target.to_path_buf(),
        source,
    };
    fs::copy(file.path(), target).map_err(copy_failed)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(target, fs::Permissions::from_mode(0o755)).map_err(copy_failed)?;
    }

    // Dropping the handle removes the temp file
    drop(file);
    Ok(ReplaceMethod::Copy)
}
