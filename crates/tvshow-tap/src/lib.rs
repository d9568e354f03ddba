//! tvshow-tap - release descriptor host
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Installs, tests and maintains tvshow releases from their descriptor.
//!
//! # Overview
//!
//! The descriptor (`Formula/tvshow.toml`) names one prebuilt artifact per
//! platform together with its SHA-256. `tvshow-tap install` picks the variant
//! for the host, downloads and verifies it, places the binary into
//! `~/.tvshow-tap/bin` and runs the descriptor's smoke test. The remaining
//! commands are for release authors: validating a descriptor, filling in
//! checksums, bumping the version and rendering the Homebrew formula.

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tvshow_schema::{Arch, Os};

pub use tvshow_core::USER_AGENT;

#[derive(Debug, Parser)]
#[command(name = "tvshow-tap")]
#[command(author, version, about = "tvshow-tap - install tvshow releases from their descriptor")]
pub struct Cli {
    /// Release descriptor to operate on
    #[arg(
        long,
        global = true,
        env = "TVSHOW_TAP_FORMULA",
        default_value = "Formula/tvshow.toml"
    )]
    pub formula: PathBuf,

    /// Install prefix (defaults to ~/.tvshow-tap)
    #[arg(long, global = true, env = "TVSHOW_TAP_HOME")]
    pub prefix: Option<PathBuf>,

    /// Fetch release artifacts from this base URL instead of the release host
    #[arg(long, global = true, env = "TVSHOW_TAP_MIRROR")]
    pub mirror: Option<String>,

    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the descriptor's package metadata and variants
    Info,
    /// Show which variant a platform resolves to
    Resolve {
        /// Operating system (defaults to the host)
        #[arg(long)]
        os: Option<Os>,
        /// Architecture (defaults to the host)
        #[arg(long)]
        arch: Option<Arch>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download, verify and install the binary for this host
    Install {
        /// Operating system (defaults to the host)
        #[arg(long)]
        os: Option<Os>,
        /// Architecture (defaults to the host)
        #[arg(long)]
        arch: Option<Arch>,
        /// Skip the post-install smoke test
        #[arg(long)]
        skip_test: bool,
        /// Reinstall even if already installed
        #[arg(long, short = 'f')]
        force: bool,
        /// Smoke test timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
    /// Run the smoke test against the installed binary
    Test {
        /// Smoke test timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
    /// Remove the installed binary and its receipt
    Uninstall,
    /// Show what is installed
    Status {
        /// Print the receipt as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the descriptor
    Check {
        /// Also fail on placeholder checksums
        #[arg(long)]
        strict: bool,
    },
    /// Render the Homebrew formula
    Render {
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Compute artifact checksums
    Checksum {
        /// Write the checksums into the descriptor
        #[arg(long)]
        write: bool,
        /// Recompute checksums that are already set
        #[arg(long)]
        all: bool,
    },
    /// Move the descriptor to a new version (resets checksums)
    Bump {
        /// New version, e.g. 0.1.3
        version: String,
    },
    /// Compute SHA256 hash of a file (for descriptor authoring)
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}
