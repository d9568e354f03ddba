//! Install, test and uninstall commands

use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use tvshow_core::{InstallOptions, InstallOutcome, Reporter};
use tvshow_schema::{Arch, Os};

use super::{Context, target_platform};

/// Options for [`install`], straight from the command line
#[derive(Debug, Clone)]
pub struct InstallArgs {
    pub os: Option<Os>,
    pub arch: Option<Arch>,
    pub skip_test: bool,
    pub force: bool,
    pub timeout: u64,
}

/// Install the variant for the requested (or host) platform
pub async fn install(ctx: &Context, args: &InstallArgs) -> Result<()> {
    let desc = ctx.descriptor()?;
    let platform = target_platform(args.os, args.arch)?;
    let installer = ctx.installer()?;
    let output = &ctx.output;

    let opts = InstallOptions {
        force: args.force,
        run_test: !args.skip_test,
        smoke_timeout: Duration::from_secs(args.timeout),
        dry_run: ctx.dry_run,
        mirror: ctx.mirror.clone(),
    };

    output.section(&format!("Installing {} {}", desc.name(), desc.version()));
    let outcome = installer
        .install(&desc, platform, &opts)
        .await
        .with_context(|| format!("Failed to install {} for {platform}", desc.name()))?;

    match outcome {
        InstallOutcome::Installed(receipt) => {
            for file in &receipt.files {
                output.info(&format!("installed {}", file.display()));
            }
            output.success(&format!(
                "{} {} installed into {}",
                receipt.name,
                receipt.version,
                installer.layout().bin_dir().display()
            ));
        }
        InstallOutcome::AlreadyInstalled(receipt) => {
            output.success(&format!(
                "{} {} is already installed (use --force to reinstall)",
                receipt.name, receipt.version
            ));
        }
        InstallOutcome::DryRun(resolved) => {
            output.info(&format!("Would download {}", resolved.url));
            output.info(&format!("Expected sha256 {}", resolved.checksum));
            output.info(&format!(
                "Would install {} into {}",
                desc.bin_names().join(", "),
                installer.layout().bin_dir().display()
            ));
        }
    }
    Ok(())
}

/// Run the smoke test against the installed binary
pub async fn test(ctx: &Context, timeout: u64) -> Result<()> {
    let desc = ctx.descriptor()?;
    let installer = ctx.installer()?;

    installer
        .test(&desc, Duration::from_secs(timeout))
        .await
        .with_context(|| format!("{} failed its smoke test", desc.name()))?;

    ctx.output.success(&format!(
        "{} {} passed: output contains \"{}\"",
        desc.name(),
        desc.version(),
        desc.smoke_expect()
    ));
    Ok(())
}

/// Remove the installed binaries and the receipt
pub fn uninstall(ctx: &Context) -> Result<()> {
    let desc = ctx.descriptor()?;
    let installer = ctx.installer()?;
    let name = desc.name();

    if ctx.dry_run {
        match installer.status(name)? {
            Some(receipt) => {
                for file in &receipt.files {
                    ctx.output.info(&format!("Would remove {}", file.display()));
                }
            }
            None => ctx.output.info(&format!("{name} is not installed")),
        }
        return Ok(());
    }

    match installer.uninstall(name)? {
        Some(receipt) => {
            ctx.output.success(&format!(
                "Removed {} {} ({} file{})",
                receipt.name,
                receipt.version,
                receipt.files.len(),
                if receipt.files.len() == 1 { "" } else { "s" }
            ));
            Ok(())
        }
        None => bail!("{name} is not installed"),
    }
}
