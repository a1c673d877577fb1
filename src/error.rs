//! Error types for cs
//!
//! All modules use `CsResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cs operations
pub type CsResult<T> = Result<T, CsError>;

/// All errors that can occur in cs
#[derive(Error, Debug)]
pub enum CsError {
    // Input errors
    #[error("Source file not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Failed to read source file {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache errors
    #[error("Failed to resolve cache dir")]
    CacheDirUnresolved,

    #[error("Failed to create cache dir {path}: {source}")]
    CacheDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Build and launch errors
    #[error("Compile failed ({code})")]
    CompileFailed { code: i32 },

    #[error("Failed to run {path}: {source}")]
    LaunchFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Update errors
    #[error("Update requires CS_REPO_OWNER and CS_REPO_NAME")]
    UpdateSourceMissing,

    #[error("Request to {url} failed: {reason}")]
    Http {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Failed to parse release tag")]
    ReleaseTagMissing,

    #[error("Release asset not found for {os}/{arch} (missing: {})", missing.join(", "))]
    ReleaseAssetNotFound {
        os: String,
        arch: String,
        missing: Vec<String>,
    },

    #[error("Invalid checksum file: {0}")]
    ChecksumInvalid(String),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("sha256 tool not available")]
    NoDigestTool,

    #[error("Failed to resolve current binary path")]
    SelfPathUnresolved,

    #[error("Failed to replace binary {path}: {source}")]
    ReplaceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CsError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Process exit code for this error.
    ///
    /// Compiler failures keep the compiler's own code; everything else is 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::CompileFailed { code } => match u8::try_from(*code) {
                Ok(0) | Err(_) => 1,
                Ok(code) => code,
            },
            _ => 1,
        }
    }

    /// Check if a failed request is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { status: Some(code), .. } if (500..600).contains(code))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::UpdateSourceMissing => {
                Some("Set CS_REPO_OWNER and CS_REPO_NAME, or [update] owner/repo in config.toml")
            }
            Self::CacheDirUnresolved => Some("Pass --cache-dir or set CS_CACHE_DIR"),
            Self::NoDigestTool => Some("Install sha256sum or shasum, or set [update] digest = \"builtin\""),
            Self::ChecksumMismatch { .. } => Some("The download may be corrupted; retry the update"),
            _ => None,
        }
    }
}
