//! Build fingerprints
//!
//! A fingerprint is a 64-bit FNV-1a hash over everything that can change
//! the compiled artifact: source bytes, compiler name and flag strings.
//! Collision resistance is not a goal, only change detection.

use crate::error::{CsError, CsResult};
use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Seed used by every cs release; changing it renames every cache entry.
const SEED: u64 = 1469598103934665603;
const FNV_PRIME: u64 = 1099511628211;
const CHUNK_SIZE: usize = 8192;
const COMPONENT_SEPARATOR: u8 = 0;

/// Fold `bytes` into an FNV-1a state
pub fn hash_update(mut hash: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hash a file's contents, streaming it in fixed-size chunks
pub fn hash_file(path: &Path) -> CsResult<u64> {
    let unreadable = |source| CsError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(unreadable)?;
    let mut hash = SEED;
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hash = hash_update(hash, &buffer[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(unreadable(e)),
        }
    }
    Ok(hash)
}

fn hash_component(hash: u64, bytes: &[u8]) -> u64 {
    hash_update(hash_update(hash, &[COMPONENT_SEPARATOR]), bytes)
}

/// Cache key for one build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint a build of `source` with the given toolchain and flags.
    ///
    /// Flags are joined with single spaces in the order given, so
    /// reordering them produces a different fingerprint. A NUL byte
    /// precedes the toolchain and each flag string, keeping component
    /// boundaries apart (`cc` + `-O2` is not `cc-O2`).
    pub fn compute(
        source: &Path,
        toolchain: &str,
        cflags: &[String],
        ldflags: &[String],
    ) -> CsResult<Self> {
        let mut hash = hash_file(source)?;
        hash = hash_component(hash, toolchain.as_bytes());
        for flags in [cflags, ldflags] {
            hash = hash_component(hash, flags.join(" ").as_bytes());
        }
        Ok(Self(hash))
    }
}

impl From<u64> for Fingerprint {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
