//! Checksum verification for downloaded binaries
//!
//! The published checksum file and the locally computed digest are both
//! reduced to their first whitespace-delimited token and compared
//! byte-for-byte. Anything else fails the update.

use crate::config::DigestBackend;
use crate::error::{CsError, CsResult};
use crate::process::ProcessRunner;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::debug;

/// External tools tried in order by the `external` backend
const DIGEST_TOOLS: &[(&str, &[&str])] = &[("sha256sum", &[]), ("shasum", &["-a", "256"])];

/// First whitespace-delimited token of `text`
fn first_token(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

/// SHA-256 of a file as lowercase hex
pub fn sha256_file(path: &Path) -> CsResult<String> {
    let mut file = File::open(path)
        .map_err(|e| CsError::io(format!("opening {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .map_err(|e| CsError::io(format!("hashing {}", path.display()), e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Verifies downloads against published checksums
pub struct Verifier<'a> {
    backend: DigestBackend,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Verifier<'a> {
    /// Create a verifier; `runner` is only used by the external backend
    pub fn new(backend: DigestBackend, runner: &'a dyn ProcessRunner) -> Self {
        Self { backend, runner }
    }

    /// Check `file` against the contents of a checksum file
    pub fn verify(&self, file: &Path, checksum_text: &str) -> CsResult<()> {
        let expected = first_token(checksum_text)
            .ok_or_else(|| CsError::ChecksumInvalid("empty checksum file".to_string()))?;
        let actual = self.digest(file)?;
        debug!("sha256 expected {} actual {}", expected, actual);

        if actual != expected {
            return Err(CsError::ChecksumMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    /// Digest of `file` using the configured backend
    pub fn digest(&self, file: &Path) -> CsResult<String> {
        match self.backend {
            DigestBackend::Builtin => sha256_file(file),
            DigestBackend::External => self.external_digest(file),
        }
    }

    fn external_digest(&self, file: &Path) -> CsResult<String> {
        for (tool, flags) in DIGEST_TOOLS {
            let mut args: Vec<String> = flags.iter().map(|f| f.to_string()).collect();
            args.push(file.to_string_lossy().into_owned());

            match self.runner.run(tool, &args) {
                Ok(out) if out.success() => {
                    if let Some(token) = first_token(&out.stdout) {
                        return Ok(token.to_string());
                    }
                    debug!("{} produced no digest", tool);
                }
                Ok(out) => debug!("{} exited with {}", tool, out.exit_code),
                Err(e) => debug!("{} unavailable: {}", tool, e),
            }
        }
        Err(CsError::NoDigestTool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fake::FakeRunner;
    use std::fs;
    use tempfile::TempDir;

    // sha256("hello\n")
    const HELLO_SHA256: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

    fn hello_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("cs-candidate");
        fs::write(&path, "hello\n").unwrap();
        path
    }

    #[test]
    fn builtin_digest_matches_known_value() {
        let dir = TempDir::new().unwrap();
        assert_eq!(sha256_file(&hello_file(&dir)).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn verify_accepts_sha256sum_format() {
        let dir = TempDir::new().unwrap();
        let file = hello_file(&dir);
        let runner = FakeRunner::new();

        let checksum = format!("{}  cs-linux-amd64\n", HELLO_SHA256);
        Verifier::new(DigestBackend::Builtin, &runner)
            .verify(&file, &checksum)
            .unwrap();
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn verify_rejects_mismatch() {
        let dir = TempDir::new().unwrap();
        let file = hello_file(&dir);
        let runner = FakeRunner::new();

        let err = Verifier::new(DigestBackend::Builtin, &runner)
            .verify(&file, &"0".repeat(64))
            .unwrap_err();
        match err {
            CsError::ChecksumMismatch { expected, actual } => {
                assert_eq!(expected, "0".repeat(64));
                assert_eq!(actual, HELLO_SHA256);
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn verify_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let file = hello_file(&dir);
        let runner = FakeRunner::new();

        let err = Verifier::new(DigestBackend::Builtin, &runner)
            .verify(&file, &HELLO_SHA256.to_uppercase())
            .unwrap_err();
        assert!(matches!(err, CsError::ChecksumMismatch { .. }));
    }

    #[test]
    fn verify_rejects_empty_checksum_file() {
        let dir = TempDir::new().unwrap();
        let file = hello_file(&dir);
        let runner = FakeRunner::new();

        let err = Verifier::new(DigestBackend::Builtin, &runner)
            .verify(&file, "  \n")
            .unwrap_err();
        assert!(matches!(err, CsError::ChecksumInvalid(_)));
    }

    #[test]
    fn external_uses_sha256sum_first() {
        let dir = TempDir::new().unwrap();
        let file = hello_file(&dir);
        let runner = FakeRunner::new()
            .respond("sha256sum", 0, &format!("{}  {}\n", HELLO_SHA256, file.display()));

        Verifier::new(DigestBackend::External, &runner)
            .verify(&file, HELLO_SHA256)
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "sha256sum");
    }

    #[test]
    fn external_falls_back_to_shasum() {
        let dir = TempDir::new().unwrap();
        let file = hello_file(&dir);
        let runner = FakeRunner::new()
            .respond("shasum", 0, &format!("{}  {}\n", HELLO_SHA256, file.display()));

        Verifier::new(DigestBackend::External, &runner)
            .verify(&file, HELLO_SHA256)
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, "shasum");
        assert_eq!(calls[1].1[..2], ["-a".to_string(), "256".to_string()]);
    }

    #[test]
    fn external_without_tools_fails() {
        let dir = TempDir::new().unwrap();
        let file = hello_file(&dir);
        let runner = FakeRunner::new().respond("sha256sum", 1, "");

        let err = Verifier::new(DigestBackend::External, &runner)
            .verify(&file, HELLO_SHA256)
            .unwrap_err();
        assert!(matches!(err, CsError::NoDigestTool));
    }
}
