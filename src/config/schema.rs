//! Configuration schema for cs
//!
//! Configuration is stored at `~/.config/cs/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compiler settings
    pub build: BuildConfig,

    /// Artifact cache settings
    pub cache: CacheConfig,

    /// Self-update settings
    pub update: UpdateConfig,
}

/// Compiler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Compiler command
    pub cc: String,

    /// Compiler flags, placed before any `--cflags` from the command line
    pub cflags: Vec<String>,

    /// Linker flags, placed before any `--ldflags` from the command line
    pub ldflags: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cc: "cc".to_string(),
            cflags: vec![],
            ldflags: vec![],
        }
    }
}

/// Artifact cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Reuse compiled artifacts (default: true)
    pub enabled: bool,

    /// Cache root override
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// How the downloaded binary gets hashed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestBackend {
    /// In-process SHA-256
    #[default]
    Builtin,
    /// `sha256sum`, falling back to `shasum -a 256`
    External,
}

/// Self-update settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Repository owner releases are published under
    pub owner: Option<String>,

    /// Repository name releases are published under
    pub repo: Option<String>,

    /// Release API base URL
    pub api_base: String,

    /// Digest implementation used for checksum verification
    pub digest: DigestBackend,

    /// Attempts for the release metadata request (5xx responses only)
    pub max_attempts: u32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            api_base: "https://api.github.com".to_string(),
            digest: DigestBackend::Builtin,
            max_attempts: 6,
        }
    }
}
