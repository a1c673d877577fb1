//! cs - run a C file as a script
//!
//! Compiles a C source file into a content-addressed cache and replaces
//! the current process with the result. Also carries a checksum-verified
//! self-updater.

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod launch;
pub mod process;
pub mod ui;
pub mod update;

pub use error::{CsError, CsResult};
