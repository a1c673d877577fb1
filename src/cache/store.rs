//! Content-addressed artifact store
//!
//! An artifact lives at `<cache_root>/<source basename>-<fingerprint>`.
//! There is no metadata: a regular file at that path is the cache entry,
//! and a changed input simply addresses a different path.

use super::fingerprint::Fingerprint;
use crate::error::{CsError, CsResult};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name component of the source, used to make cache entries readable
fn source_basename(source: &Path) -> OsString {
    source
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("script"))
}

fn entry_name(source: &Path, fingerprint: Fingerprint) -> OsString {
    let mut name = source_basename(source);
    name.push(format!("-{}", fingerprint));
    name
}

/// Create the cache root and any missing parents.
///
/// A directory created concurrently by another invocation is not an error.
pub fn ensure_dir(root: &Path) -> CsResult<()> {
    if root.as_os_str().is_empty() {
        return Err(CsError::CacheDirCreate {
            path: root.to_path_buf(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "empty path"),
        });
    }
    if root.is_dir() {
        return Ok(());
    }

    match fs::create_dir_all(root) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && root.is_dir() => Ok(()),
        Err(source) => Err(CsError::CacheDirCreate {
            path: root.to_path_buf(),
            source,
        }),
    }
}

/// Artifact store rooted at one directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open the store, creating the root directory if needed
    pub fn open(root: impl Into<PathBuf>) -> CsResult<Self> {
        let root = root.into();
        ensure_dir(&root)?;
        debug!("Cache root: {}", root.display());
        Ok(Self { root })
    }

    /// Artifact path for a source file and fingerprint
    pub fn resolve(&self, source: &Path, fingerprint: Fingerprint) -> PathBuf {
        self.root.join(entry_name(source, fingerprint))
    }

    /// Whether a cached artifact exists at `artifact`
    pub fn exists(artifact: &Path) -> bool {
        fs::metadata(artifact)
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }
}

/// Where the build output for one invocation goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactTarget {
    /// Content-addressed cache entry; `hit` when it already exists
    Cached { path: PathBuf, hit: bool },
    /// Throwaway path used when caching is disabled
    Disposable { path: PathBuf },
}

impl ArtifactTarget {
    /// Path the artifact is (or will be) written to
    pub fn path(&self) -> &Path {
        match self {
            Self::Cached { path, .. } | Self::Disposable { path } => path,
        }
    }

    /// Whether the compiler has to run
    pub fn needs_build(&self) -> bool {
        !matches!(self, Self::Cached { hit: true, .. })
    }
}

/// Cache behavior for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMode {
    /// Reuse artifacts under this root
    Enabled(PathBuf),
    /// Always rebuild into a fresh disposable path
    Disabled,
}

impl CacheMode {
    /// Pick the output path for a build of `source`
    pub fn target(&self, source: &Path, fingerprint: Fingerprint) -> CsResult<ArtifactTarget> {
        match self {
            Self::Enabled(root) => {
                let store = CacheStore::open(root)?;
                let path = store.resolve(source, fingerprint);
                let hit = CacheStore::exists(&path);
                Ok(ArtifactTarget::Cached { path, hit })
            }
            Self::Disabled => {
                let dir = std::env::temp_dir();
                prune_disposable(&dir, source, fingerprint);
                Ok(ArtifactTarget::Disposable {
                    path: disposable_path(&dir, source, fingerprint, std::process::id()),
                })
            }
        }
    }
}

fn disposable_prefix(source: &Path, fingerprint: Fingerprint) -> OsString {
    let mut name = OsString::from("cs-");
    name.push(entry_name(source, fingerprint));
    name.push("-");
    name
}

/// Throwaway output path under `dir`, keyed on the building process.
///
/// The artifact is exec'd in place of `cs`, so it keeps `pid` while it runs.
fn disposable_path(dir: &Path, source: &Path, fingerprint: Fingerprint, pid: u32) -> PathBuf {
    let mut name = disposable_prefix(source, fingerprint);
    name.push(pid.to_string());
    dir.join(name)
}

/// Delete disposable artifacts for this source and fingerprint whose
/// process has exited. Returns how many were removed.
pub fn prune_disposable(dir: &Path, source: &Path, fingerprint: Fingerprint) -> usize {
    let prefix = disposable_prefix(source, fingerprint);
    let Some(prefix) = prefix.to_str() else {
        return 0;
    };
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    let own = std::process::id();
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(pid) = name
            .to_str()
            .and_then(|n| n.strip_prefix(prefix))
            .and_then(|rest| rest.parse::<u32>().ok())
        else {
            continue;
        };
        if pid == own || process_alive(pid) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => debug!("Could not remove {}: {}", entry.path().display(), e),
        }
    }
    if removed > 0 {
        debug!("Removed {} stale disposable artifact(s) from {}", removed, dir.display());
    }
    removed
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 performs the permission and existence checks only
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}
