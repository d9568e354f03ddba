//! Prefix directory layout and path helpers.

use dirs::home_dir;
use std::path::{Path, PathBuf};

/// Environment variable overriding the prefix root.
pub const HOME_ENV: &str = "TVSHOW_TAP_HOME";

/// Directory tree owned by the installer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Use `root` as the prefix.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the prefix from `TVSHOW_TAP_HOME`, falling back to `~/.tvshow-tap`.
    ///
    /// Returns `None` if neither is available.
    pub fn from_env() -> Option<Self> {
        if let Ok(val) = std::env::var(HOME_ENV) {
            if !val.is_empty() {
                return Some(Self::new(val));
            }
        }
        home_dir().map(|h| Self::new(h.join(".tvshow-tap")))
    }

    /// Prefix root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Binary installation target: <root>/bin
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Download cache: <root>/cache
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Install receipts: <root>/receipts
    pub fn receipts_dir(&self) -> PathBuf {
        self.root.join("receipts")
    }

    /// Staging area: <root>/tmp (guaranteed same volume as bin/)
    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Receipt file for a package.
    pub fn receipt_path(&self, package: &str) -> PathBuf {
        self.receipts_dir().join(format!("{package}.json"))
    }

    /// Create every directory of the layout.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered.
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [
            self.bin_dir(),
            self.cache_dir(),
            self.receipts_dir(),
            self.tmp_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
