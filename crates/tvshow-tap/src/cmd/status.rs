//! Status command

use anyhow::{Context as _, Result};
use crossterm::style::Stylize;
use tvshow_core::Reporter;

use super::Context;

/// Show the install receipt, and whether it matches the descriptor
pub fn status(ctx: &Context, json: bool) -> Result<()> {
    let desc = ctx.descriptor()?;
    let installer = ctx.installer()?;
    let receipt = installer.status(desc.name())?;

    if json {
        let value = serde_json::to_string_pretty(&receipt).context("Failed to encode receipt")?;
        println!("{value}");
        return Ok(());
    }

    let label_width = 12;
    println!();
    println!("{}", "Install status".dark_grey());
    println!();
    println!(
        "{:<width$}{}",
        "Prefix:",
        installer.layout().root().display(),
        width = label_width
    );
    println!(
        "{:<width$}{} {}",
        "Descriptor:",
        desc.name(),
        desc.version(),
        width = label_width
    );

    let Some(receipt) = receipt else {
        println!("{:<width$}{}", "Installed:", "no", width = label_width);
        println!();
        return Ok(());
    };

    println!(
        "{:<width$}{} ({}, {})",
        "Installed:",
        receipt.version,
        receipt.platform,
        receipt.installed_at.format("%Y-%m-%d %H:%M"),
        width = label_width
    );
    println!(
        "{:<width$}{}",
        "Smoke test:",
        if receipt.tested { "passed" } else { "not passed" },
        width = label_width
    );
    for file in &receipt.files {
        let state = if file.is_file() { "" } else { " (missing)" };
        println!(
            "{:<width$}{}{}",
            "",
            file.display(),
            state.red(),
            width = label_width
        );
    }

    println!();
    if receipt.version == *desc.version() {
        println!("{}", "Up to date".dark_grey());
    } else {
        ctx.output.warning(&format!(
            "Installed {} differs from descriptor {}; run `tvshow-tap install`",
            receipt.version,
            desc.version()
        ));
    }
    println!();
    Ok(())
}
