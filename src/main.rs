//! cs - run a C file as a script
//!
//! CLI entry point: either self-updates or compiles and runs a source file.

use clap::Parser;
use console::style;
use cs::cli::{commands, Cli};
use cs::config::ConfigManager;
use cs::error::CsResult;
use cs::process::SystemRunner;
use cs::update::UreqFetcher;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> CsResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug; stderr keeps the program's stdout clean
    let filter = match cli.verbose {
        0 => EnvFilter::new("cs=warn"),
        1 => EnvFilter::new("cs=info"),
        _ => EnvFilter::new("cs=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    debug!("Config path: {}", config_manager.path().display());
    let config = config_manager.load()?;

    let runner = SystemRunner::new();
    if cli.update {
        return commands::update(&config, &UreqFetcher::from_env(), &runner);
    }
    commands::run(&cli, &config, &runner)
}
