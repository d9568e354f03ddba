//! Host-side pipeline for tvshow release descriptors.
//!
//! Given a [`ReleaseDescriptor`](tvshow_schema::ReleaseDescriptor) and a
//! platform, [`install::Installer`] selects the variant, downloads it while
//! hashing, refuses anything whose SHA-256 differs from the recorded checksum,
//! extracts it, places the named binaries into the prefix's `bin/` directory
//! and optionally smoke-tests the result.
//!
//! # Prefix Layout
//!
//! ```text
//! ~/.tvshow-tap/
//! ├── bin/        # Installed executables
//! ├── cache/      # Verified archives (by hash)
//! ├── receipts/   # One JSON receipt per installed package
//! └── tmp/        # Extraction staging (same volume as bin/)
//! ```

pub mod homebrew;
pub mod install;
pub mod io;
pub mod paths;
pub mod receipt;
pub mod refresh;
pub mod reporter;
pub mod smoke;

pub use install::{InstallError, InstallOptions, InstallOutcome, Installer};
pub use paths::Layout;
pub use reporter::{NullReporter, Reporter};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("tvshow-tap/", env!("CARGO_PKG_VERSION"));
