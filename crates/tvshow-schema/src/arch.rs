//! Host platform identification.
//!
//! A release ships one prebuilt artifact per (OS, architecture) pair. The
//! installer detects the host pair with [`Platform::current`] and looks it up
//! in the descriptor's variant table.
//!
//! # Example
//!
//! ```
//! use tvshow_schema::{Arch, Os, Platform};
//!
//! let platform = Platform::new(Os::MacOs, Arch::Arm64);
//! assert_eq!(platform.target_triple(), "aarch64-apple-darwin");
//! ```

/// Operating system family a variant targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Apple macOS (Darwin kernel).
    #[serde(alias = "darwin")]
    MacOs,
    /// Linux with a GNU userland.
    Linux,
}

impl Os {
    /// Get the current operating system, if it is one we ship artifacts for.
    pub fn current() -> Option<Self> {
        Self::from_consts(std::env::consts::OS)
    }

    fn from_consts(os: &str) -> Option<Self> {
        match os {
            "macos" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
        }
    }

    /// Vendor and system part of the Rust target triple.
    fn triple_suffix(self) -> &'static str {
        match self {
            Self::MacOs => "apple-darwin",
            Self::Linux => "unknown-linux-gnu",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "macos" | "darwin" | "osx" | "mac" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            _ => Err(format!("Unknown operating system: {s}")),
        }
    }
}

/// CPU architecture a variant targets.
///
/// Homebrew calls these `arm` and `intel`; the aliases are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit ARM (Apple Silicon, Graviton, Raspberry Pi 4+).
    #[serde(alias = "arm", alias = "aarch64")]
    Arm64,
    /// 64-bit Intel/AMD.
    #[serde(alias = "intel", alias = "amd64")]
    X86_64,
}

impl Arch {
    /// Get the current architecture, if it is one we ship artifacts for.
    pub fn current() -> Option<Self> {
        Self::from_consts(std::env::consts::ARCH)
    }

    fn from_consts(arch: &str) -> Option<Self> {
        match arch {
            "aarch64" => Some(Self::Arm64),
            "x86_64" => Some(Self::X86_64),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::X86_64 => "x86_64",
        }
    }

    /// Rust-convention architecture name (`aarch64` / `x86_64`).
    ///
    /// Distinct from [`as_str()`](Self::as_str) which uses platform names
    /// (`arm64`). The value matches `std::env::consts::ARCH`.
    pub fn rust_name(&self) -> &'static str {
        match self {
            Self::Arm64 => "aarch64",
            Self::X86_64 => "x86_64",
        }
    }

    /// Homebrew's block name for this architecture (`on_arm` / `on_intel`).
    pub fn homebrew_name(&self) -> &'static str {
        match self {
            Self::Arm64 => "arm",
            Self::X86_64 => "intel",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "arm64" | "aarch64" | "arm" => Ok(Self::Arm64),
            "x86_64" | "amd64" | "intel" | "x64" => Ok(Self::X86_64),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

/// An (OS, architecture) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Build a platform from its parts.
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the host platform.
    ///
    /// Returns `None` on hosts outside the supported OS/architecture set
    /// (e.g. Windows or 32-bit ARM).
    pub fn current() -> Option<Self> {
        Some(Self::new(Os::current()?, Arch::current()?))
    }

    /// Rust target triple, used in artifact names
    /// (e.g. `tvshow-aarch64-apple-darwin.tar.gz`).
    pub fn target_triple(&self) -> String {
        format!("{}-{}", self.arch.rust_name(), self.os.triple_suffix())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
