//! Artifact launch
//!
//! On Unix the compiled artifact replaces the `cs` process image, so the
//! script's exit code, signals and stdio are its own.

use crate::error::CsError;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Command that runs `artifact` with `args`, `argv0` overriding argv[0]
pub fn launch_command(artifact: &Path, argv0: Option<&str>, args: &[OsString]) -> Command {
    let mut command = Command::new(artifact);
    command.args(args);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        match argv0 {
            Some(name) => command.arg0(name),
            None => command.arg0(artifact),
        };
    }
    #[cfg(not(unix))]
    let _ = argv0;

    command
}

/// Replace the current process with `artifact`.
///
/// Only returns if the exec itself failed.
#[cfg(unix)]
pub fn launch(artifact: &Path, argv0: Option<&str>, args: &[OsString]) -> CsError {
    use std::os::unix::process::CommandExt;

    let source = launch_command(artifact, argv0, args).exec();
    CsError::LaunchFailed {
        path: artifact.to_path_buf(),
        source,
    }
}

/// Run `artifact` to completion and exit with its code.
#[cfg(not(unix))]
pub fn launch(artifact: &Path, argv0: Option<&str>, args: &[OsString]) -> CsError {
    match launch_command(artifact, argv0, args).status() {
        Ok(status) => std::process::exit(crate::process::exit_code(status)),
        Err(source) => CsError::LaunchFailed {
            path: artifact.to_path_buf(),
            source,
        },
    }
}
