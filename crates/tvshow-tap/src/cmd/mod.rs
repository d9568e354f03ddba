//! Subcommand implementations.

pub mod completions;
pub mod descriptor;
pub mod hash;
pub mod info;
pub mod install;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tvshow_core::{Installer, Layout};
use tvshow_schema::{Arch, Os, Platform, ReleaseDescriptor};

use crate::Cli;
use crate::ui::Output;

/// State shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub formula: PathBuf,
    pub prefix: Option<PathBuf>,
    pub mirror: Option<String>,
    pub dry_run: bool,
    pub output: Output,
}

impl Context {
    /// Build the context from global flags.
    ///
    /// The prefix is resolved on first use, so commands that never touch it
    /// work without a home directory.
    pub fn from_cli(cli: &Cli) -> Self {
        tracing::debug!(
            formula = %cli.formula.display(),
            mirror = cli.mirror.as_deref().unwrap_or("-"),
            "context"
        );
        Self {
            formula: cli.formula.clone(),
            prefix: cli.prefix.clone(),
            mirror: cli.mirror.clone(),
            dry_run: cli.dry_run,
            output: Output::new(cli.quiet),
        }
    }

    /// Prefix layout from `--prefix`, `TVSHOW_TAP_HOME` or the home directory.
    pub fn layout(&self) -> Result<Layout> {
        let layout = match &self.prefix {
            Some(dir) => Layout::new(dir),
            None => Layout::from_env().context("Could not determine home directory")?,
        };
        tracing::debug!(prefix = %layout.root().display(), "layout");
        Ok(layout)
    }

    /// Load the descriptor named by `--formula`.
    pub fn descriptor(&self) -> Result<ReleaseDescriptor> {
        ReleaseDescriptor::from_file(&self.formula)
            .with_context(|| format!("Failed to load descriptor {}", self.formula.display()))
    }

    /// Installer writing into this context's prefix.
    pub fn installer(&self) -> Result<Installer> {
        Ok(Installer::new(
            http_client()?,
            self.layout()?,
            Arc::new(self.output.clone()),
        ))
    }
}

/// HTTP client used for every download.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(crate::USER_AGENT)
        .connect_timeout(std::time::Duration::from_secs(15))
        .build()
        .context("Failed to build HTTP client")
}

/// Platform from explicit flags, filling gaps from the host.
pub fn target_platform(os: Option<Os>, arch: Option<Arch>) -> Result<Platform> {
    let unsupported = || {
        format!(
            "unsupported platform: {}/{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        )
    };
    match (os, arch) {
        (Some(os), Some(arch)) => Ok(Platform::new(os, arch)),
        (None, None) => Platform::current().with_context(unsupported),
        (os, arch) => {
            let os = match os {
                Some(os) => os,
                None => Os::current().with_context(unsupported)?,
            };
            let arch = match arch {
                Some(arch) => arch,
                None => Arch::current().with_context(unsupported)?,
            };
            Ok(Platform::new(os, arch))
        }
    }
}
