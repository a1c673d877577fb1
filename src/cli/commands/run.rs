//! Run command - compile a source file if needed and exec it

use crate::build::{self, BuildRequest, Builder};
use crate::cache::{CacheMode, Fingerprint};
use crate::cli::args::Cli;
use crate::config::{Config, ConfigManager};
use crate::error::{CsError, CsResult};
use crate::launch;
use crate::process::ProcessRunner;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything needed to build and run one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub source: PathBuf,
    pub args: Vec<OsString>,
    pub toolchain: String,
    pub include_dir: Option<PathBuf>,
    pub cflags: Vec<String>,
    pub ldflags: Vec<String>,
    pub cache: CacheMode,
    pub argv0: Option<String>,
}

impl RunSettings {
    /// Merge command-line arguments over the config file.
    ///
    /// `--cc` replaces the configured compiler; `--cflags`/`--ldflags`
    /// are appended after the configured flags.
    pub fn resolve(cli: &Cli, config: &Config) -> CsResult<Self> {
        let source = cli
            .source()
            .ok_or_else(|| CsError::SourceNotFound(PathBuf::new()))?
            .to_path_buf();

        let cache = if cli.no_cache || !config.cache.enabled {
            CacheMode::Disabled
        } else {
            let root = cli
                .cache_dir
                .clone()
                .or_else(|| config.cache.dir.clone())
                .or_else(ConfigManager::default_cache_dir)
                .ok_or(CsError::CacheDirUnresolved)?;
            CacheMode::Enabled(root)
        };

        let mut cflags = config.build.cflags.clone();
        cflags.extend(cli.cflags.iter().cloned());
        let mut ldflags = config.build.ldflags.clone();
        ldflags.extend(cli.ldflags.iter().cloned());

        Ok(Self {
            source,
            args: cli.program_args().to_vec(),
            toolchain: cli.cc.clone().unwrap_or_else(|| config.build.cc.clone()),
            include_dir: build::default_include_dir(),
            cflags,
            ldflags,
            cache,
            argv0: cli.argv0.clone(),
        })
    }
}

/// Make sure an up-to-date artifact exists and return its path
pub fn prepare(settings: &RunSettings, runner: &dyn ProcessRunner) -> CsResult<PathBuf> {
    let source = &settings.source;
    if !source.is_file() {
        return Err(CsError::SourceNotFound(source.clone()));
    }

    let fingerprint = Fingerprint::compute(
        source,
        &settings.toolchain,
        &settings.cflags,
        &settings.ldflags,
    )?;
    debug!("Fingerprint of {}: {}", source.display(), fingerprint);

    let target = settings.cache.target(source, fingerprint)?;
    let verb = if target.needs_build() { "compile" } else { "cache" };
    info!("{}: {}", verb, target.path().display());

    if target.needs_build() {
        let request = BuildRequest {
            toolchain: settings.toolchain.clone(),
            include_dir: settings.include_dir.clone(),
            cflags: settings.cflags.clone(),
            source: source.clone(),
            output: target.path().to_path_buf(),
            ldflags: settings.ldflags.clone(),
        };
        Builder::new(runner).build(&request)?;
    }

    Ok(target.path().to_path_buf())
}

/// Execute the run command. Returns only on failure.
pub fn execute(cli: &Cli, config: &Config, runner: &dyn ProcessRunner) -> CsResult<()> {
    let settings = RunSettings::resolve(cli, config)?;
    let artifact = prepare(&settings, runner)?;
    Err(launch::launch(
        &artifact,
        settings.argv0.as_deref(),
        &settings.args,
    ))
}
