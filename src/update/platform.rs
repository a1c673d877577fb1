//! Platform detection for release asset names

use std::fmt;

/// Operating system component of an asset name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Os {
    Linux,
    Darwin,
    /// Raw kernel name for anything else
    Other(String),
}

/// CPU architecture component of an asset name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    Arm64,
    /// Raw machine name for anything else
    Other(String),
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Darwin => write!(f, "darwin"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amd64 => write!(f, "amd64"),
            Self::Arm64 => write!(f, "arm64"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Host platform as named in release assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    /// Map kernel and machine names (as from `uname`) to asset naming
    pub fn from_uname(sysname: &str, machine: &str) -> Self {
        let os = match sysname {
            "Linux" => Os::Linux,
            "Darwin" => Os::Darwin,
            other => Os::Other(other.to_string()),
        };
        let arch = match machine {
            "x86_64" => Arch::Amd64,
            "aarch64" | "arm64" => Arch::Arm64,
            other => Arch::Other(other.to_string()),
        };
        Self { os, arch }
    }

    /// Detect the running system
    pub fn detect() -> Self {
        match uname() {
            Some((sysname, machine)) => Self::from_uname(&sysname, &machine),
            None => Self::from_consts(std::env::consts::OS, std::env::consts::ARCH),
        }
    }

    /// Fallback mapping from Rust's compile-time target names
    fn from_consts(os: &str, arch: &str) -> Self {
        let sysname = match os {
            "linux" => "Linux",
            "macos" => "Darwin",
            other => other,
        };
        Self::from_uname(sysname, arch)
    }

    /// Binary asset name, e.g. `cs-linux-amd64`
    pub fn asset_name(&self, product: &str) -> String {
        format!("{}-{}-{}", product, self.os, self.arch)
    }

    /// Checksum asset name, e.g. `cs-linux-amd64.sha256`
    pub fn checksum_name(&self, product: &str) -> String {
        format!("{}.sha256", self.asset_name(product))
    }
}

#[cfg(unix)]
fn uname() -> Option<(String, String)> {
    use std::ffi::CStr;

    // SAFETY: utsname is plain old data and uname only writes into it
    let mut info: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut info) } != 0 {
        return None;
    }
    // SAFETY: uname NUL-terminates every field on success
    let field = |raw: &[libc::c_char]| unsafe {
        CStr::from_ptr(raw.as_ptr()).to_string_lossy().into_owned()
    };
    Some((field(&info.sysname), field(&info.machine)))
}

#[cfg(not(unix))]
fn uname() -> Option<(String, String)> {
    None
}
