//! Descriptor authoring commands: resolve, check, render, checksum, bump

use std::path::Path;

use anyhow::{Context as _, Result, bail};
use tvshow_core::{Reporter, homebrew, refresh};
use tvshow_schema::{Arch, Os, Version};

use super::{Context, http_client, target_platform};

/// Show which variant a platform resolves to
pub fn resolve(ctx: &Context, os: Option<Os>, arch: Option<Arch>, json: bool) -> Result<()> {
    let desc = ctx.descriptor()?;
    let platform = target_platform(os, arch)?;
    let resolved = desc.select(platform)?;

    if json {
        let value = serde_json::json!({
            "name": desc.name().as_str(),
            "version": desc.version().as_str(),
            "platform": platform.to_string(),
            "target": platform.target_triple(),
            "url": resolved.url,
            "sha256": resolved.checksum.to_string(),
            "artifact": resolved.artifact,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", resolved.url);
    }
    Ok(())
}

/// Validate the descriptor
pub fn check(ctx: &Context, strict: bool) -> Result<()> {
    let desc = ctx.descriptor()?;
    let output = &ctx.output;

    desc.validate()
        .with_context(|| format!("{} is invalid", ctx.formula.display()))?;

    output.success(&format!(
        "{} {} is valid ({} variant{})",
        desc.name(),
        desc.version(),
        desc.variants.len(),
        if desc.variants.len() == 1 { "" } else { "s" }
    ));
    for platform in desc.platforms() {
        output.info(&format!("{platform:<14} {}", platform.target_triple()));
    }

    let pending = desc.pending_checksums();
    if !pending.is_empty() {
        let list = pending
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if strict {
            bail!("placeholder checksums for: {list}");
        }
        output.warning(&format!(
            "placeholder checksums for: {list} (run `tvshow-tap checksum --write`)"
        ));
    }
    Ok(())
}

/// Render the Homebrew formula
pub fn render(ctx: &Context, out: Option<&Path>) -> Result<()> {
    let desc = ctx.descriptor()?;
    let formula = homebrew::render_formula(&desc);

    match out {
        Some(path) if !ctx.dry_run => {
            std::fs::write(path, formula)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            ctx.output
                .success(&format!("Wrote {}", path.display()));
        }
        _ => print!("{formula}"),
    }
    Ok(())
}

/// Compute artifact checksums and optionally write them back
pub async fn checksum(ctx: &Context, write: bool, all: bool) -> Result<()> {
    let client = http_client()?;
    let mirror = ctx.mirror.as_deref();

    let updates = if write && !ctx.dry_run {
        refresh::refresh_checksums(&client, &ctx.formula, all, mirror)
            .await
            .with_context(|| format!("Failed to refresh {}", ctx.formula.display()))?
    } else {
        let desc = ctx.descriptor()?;
        refresh::compute_checksums(&client, &desc, !all, mirror).await?
    };

    if updates.is_empty() {
        ctx.output.success("All checksums are set");
        return Ok(());
    }
    for (platform, digest) in &updates {
        println!("{digest}  {platform}");
    }

    if write && !ctx.dry_run {
        ctx.output.success(&format!(
            "Updated {} checksum{} in {}",
            updates.len(),
            if updates.len() == 1 { "" } else { "s" },
            ctx.formula.display()
        ));
    }
    Ok(())
}

/// Move the descriptor to a new version
pub fn bump(ctx: &Context, version: &str) -> Result<()> {
    let content = std::fs::read_to_string(&ctx.formula)
        .with_context(|| format!("Failed to read {}", ctx.formula.display()))?;
    let new_version = Version::from(version.trim_start_matches('v'));
    let updated = refresh::bump_version(&content, &new_version)?;

    if ctx.dry_run {
        print!("{updated}");
        return Ok(());
    }

    std::fs::write(&ctx.formula, updated)
        .with_context(|| format!("Failed to write {}", ctx.formula.display()))?;
    ctx.output.success(&format!(
        "Bumped {} to {new_version}",
        ctx.formula.display()
    ));
    ctx.output
        .info("Checksums reset; run `tvshow-tap checksum --write` once the release is published.");
    Ok(())
}
