//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// cs - run a C file as a script
///
/// Compiles SOURCE (once per distinct source, compiler and flags) and runs
/// the result with the remaining arguments.
#[derive(Parser, Debug)]
#[command(name = "cs")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Source file, then arguments for the program
    #[arg(
        value_name = "SOURCE",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "update"
    )]
    pub command: Vec<OsString>,

    /// Compiler to invoke
    #[arg(long, value_name = "CC")]
    pub cc: Option<String>,

    /// Extra compiler flags (repeatable)
    #[arg(long, value_name = "FLAGS", allow_hyphen_values = true, action = ArgAction::Append)]
    pub cflags: Vec<String>,

    /// Extra linker flags (repeatable)
    #[arg(long, value_name = "FLAGS", allow_hyphen_values = true, action = ArgAction::Append)]
    pub ldflags: Vec<String>,

    /// Directory for cached artifacts
    #[arg(long, value_name = "DIR", env = "CS_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Always rebuild into a throwaway path
    #[arg(long)]
    pub no_cache: bool,

    /// argv[0] seen by the program
    #[arg(long, value_name = "NAME")]
    pub argv0: Option<String>,

    /// Replace this binary with the latest release and exit
    #[arg(short, long)]
    pub update: bool,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "CS_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The C source to run
    pub fn source(&self) -> Option<&Path> {
        self.command.first().map(Path::new)
    }

    /// Arguments forwarded to the program, minus a separating `--`
    pub fn program_args(&self) -> &[OsString] {
        let rest = self.command.get(1..).unwrap_or_default();
        match rest.split_first() {
            Some((first, tail)) if first == "--" => tail,
            _ => rest,
        }
    }
}
