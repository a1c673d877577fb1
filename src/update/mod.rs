//! Self-update
//!
//! Replaces the running `cs` binary with the latest published release:
//!
//! 1. Fetch the latest release metadata
//! 2. Stop early if the running version is already current
//! 3. Pick the binary and checksum assets for this platform
//! 4. Download both next to the installed binary
//! 5. Verify the SHA-256 digest
//! 6. Swap the verified binary into place
//!
//! Nothing at the installed path changes unless step 6 is reached.

pub mod http;
pub mod install;
pub mod platform;
pub mod release;
pub mod verify;
pub mod version;

pub use http::{Fetcher, RetryPolicy, UreqFetcher};
pub use install::{current_self_path, ReplaceMethod};
pub use platform::Platform;
pub use release::{LatestRelease, ReleaseDescriptor, ReleaseSource};
pub use verify::Verifier;

use crate::config::DigestBackend;
use crate::error::{CsError, CsResult};
use crate::process::ProcessRunner;
use std::cmp::Ordering;
use std::fmt;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Product name used in release asset names
pub const PRODUCT: &str = "cs";

/// Progress points reported while updating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    FetchingRelease,
    DownloadingAsset,
    DownloadingChecksum,
    Verifying,
    Installing,
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FetchingRelease => "Checking for updates...",
            Self::DownloadingAsset => "Downloading release...",
            Self::DownloadingChecksum => "Downloading checksum...",
            Self::Verifying => "Verifying checksum...",
            Self::Installing => "Installing...",
        };
        f.write_str(label)
    }
}

/// Inputs for one update run
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    /// Version of the running binary
    pub current_version: String,
    pub source: ReleaseSource,
    pub platform: Platform,
    /// Installed binary to replace, if it could be located
    pub target: Option<PathBuf>,
    pub digest: DigestBackend,
    pub retry: RetryPolicy,
}

/// Result of a successful update run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate {
        current: String,
        latest: String,
    },
    Updated {
        from: String,
        to: String,
        path: PathBuf,
        method: ReplaceMethod,
    },
}

/// Runs the update pipeline over injected network and process access
pub struct Updater<'a> {
    fetcher: &'a dyn Fetcher,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Updater<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, runner: &'a dyn ProcessRunner) -> Self {
        Self { fetcher, runner }
    }

    /// Update the binary at `request.target` to the latest release
    pub fn run(
        &self,
        request: &UpdateRequest,
        on_stage: &mut dyn FnMut(UpdateStage),
    ) -> CsResult<UpdateOutcome> {
        on_stage(UpdateStage::FetchingRelease);
        let latest = release::fetch_latest(self.fetcher, &request.source, request.retry)?;
        let latest_version = latest.version().to_string();

        match version::compare_versions(&request.current_version, &latest_version) {
            Some(Ordering::Greater | Ordering::Equal) => {
                info!(
                    "Current version {} is not older than {}",
                    request.current_version, latest_version
                );
                return Ok(UpdateOutcome::UpToDate {
                    current: request.current_version.clone(),
                    latest: latest_version,
                });
            }
            Some(Ordering::Less) => {}
            None => debug!(
                "Cannot compare {} with {}, updating anyway",
                request.current_version, latest_version
            ),
        }

        let descriptor = latest.descriptor(PRODUCT, &request.platform)?;
        let target = request
            .target
            .clone()
            .ok_or(CsError::SelfPathUnresolved)?;
        debug!("Replacing {}", target.display());

        on_stage(UpdateStage::DownloadingAsset);
        let mut candidate = install::create_temp(&target, "cs-update-")?;
        let bytes = self.fetcher.download(&descriptor.asset_url, &mut candidate)?;
        candidate
            .flush()
            .map_err(|e| CsError::io("writing download", e))?;
        debug!("Downloaded {} ({} bytes)", descriptor.asset_name, bytes);

        on_stage(UpdateStage::DownloadingChecksum);
        let checksum_text = self.download_text(&descriptor.checksum_url, &target)?;

        on_stage(UpdateStage::Verifying);
        Verifier::new(request.digest, self.runner).verify(candidate.path(), &checksum_text)?;

        on_stage(UpdateStage::Installing);
        install::make_executable(candidate.path())?;
        let method = install::replace_binary(candidate, &target)?;
        info!("Installed {} at {} ({:?})", descriptor.tag, target.display(), method);

        Ok(UpdateOutcome::Updated {
            from: request.current_version.clone(),
            to: latest_version,
            path: target,
            method,
        })
    }

    /// Download a small text asset through a temp file
    fn download_text(&self, url: &str, target: &std::path::Path) -> CsResult<String> {
        let mut staged = install::create_temp(target, "cs-update-sum-")?;
        self.fetcher.download(url, &mut staged)?;

        let mut text = String::new();
        let file = staged.as_file_mut();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_string(&mut text))
            .map_err(|e| CsError::io("reading checksum file", e))?;
        Ok(text)
    }
}
