//! External process capability
//!
//! The compiler and the external digest tools are reached through the
//! `ProcessRunner` trait so callers can be exercised without spawning
//! real subprocesses.

mod system;

pub use system::SystemRunner;
#[cfg(not(unix))]
pub(crate) use system::exit_code;

use crate::error::CsResult;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (128 + signal number when killed by a signal)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with status zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Narrow interface for running external programs
pub trait ProcessRunner {
    /// Run a program to completion, capturing its output
    fn run(&self, program: &str, args: &[String]) -> CsResult<ProcessOutput>;

    /// Run a program with inherited stdio and return its exit code
    fn status(&self, program: &str, args: &[String]) -> CsResult<i32>;
}
