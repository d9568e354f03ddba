//! Install receipts.
//!
//! A receipt records what an install placed on disk so that re-running the
//! same install is a no-op and `uninstall` knows what to remove.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tvshow_schema::{PackageName, Platform, Version};

use crate::paths::Layout;

/// Record of a completed install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Installed package.
    pub name: PackageName,
    /// Installed version.
    pub version: Version,
    /// Platform whose variant was installed.
    pub platform: Platform,
    /// URL the artifact was fetched from.
    pub url: String,
    /// Verified SHA-256 of the artifact.
    pub sha256: String,
    /// Files placed into the binaries directory.
    pub files: Vec<PathBuf>,
    /// When the install finished.
    pub installed_at: DateTime<Utc>,
    /// Whether the smoke test has passed against these files.
    #[serde(default)]
    pub tested: bool,
}

impl Receipt {
    /// Load the receipt for `name`, if the package is installed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the receipt exists but cannot be read or parsed.
    pub fn load(layout: &Layout, name: &str) -> io::Result<Option<Self>> {
        let path = layout.receipt_path(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write the receipt atomically.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the receipts directory is not writable.
    pub fn save(&self, layout: &Layout) -> io::Result<PathBuf> {
        let path = layout.receipt_path(&self.name);
        std::fs::create_dir_all(layout.receipts_dir())?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Delete the receipt for `name`. Missing receipts are not an error.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the receipt exists but cannot be removed.
    pub fn remove(layout: &Layout, name: &str) -> io::Result<()> {
        match std::fs::remove_file(layout.receipt_path(name)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Whether this receipt describes exactly the given artifact and its files are still present.
    pub fn is_current(&self, version: &Version, sha256: &str) -> bool {
        self.version == *version
            && self.sha256.eq_ignore_ascii_case(sha256)
            && self.files.iter().all(|f| f.is_file())
    }
}
