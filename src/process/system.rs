//! Process runner backed by `std::process::Command`

use super::{ProcessOutput, ProcessRunner};
use crate::error::{CsError, CsResult};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Runs programs on the host system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> CsResult<ProcessOutput> {
        debug!("Executing: {} {:?}", program, args);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| CsError::command_failed(program, e))?;

        Ok(ProcessOutput {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn status(&self, program: &str, args: &[String]) -> CsResult<i32> {
        debug!("Executing interactively: {} {:?}", program, args);

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| CsError::command_failed(program, e))?;

        Ok(exit_code(status))
    }
}

/// Exit code of a finished process, shell-style for signals
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
