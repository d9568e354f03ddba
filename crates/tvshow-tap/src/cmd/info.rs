//! Info command

use anyhow::Result;
use comfy_table::{Table, presets};
use crossterm::style::Stylize;

use super::Context;

/// Show the descriptor's metadata and its variant table
pub fn info(ctx: &Context) -> Result<()> {
    let desc = ctx.descriptor()?;
    let pkg = &desc.package;
    let lw = 12;

    println!();
    println!(
        "  {} {}",
        pkg.name.as_str().white().bold(),
        pkg.version.as_str().dark_grey()
    );
    if !pkg.description.is_empty() {
        println!("  {}", pkg.description);
    }
    println!();
    if !pkg.homepage.is_empty() {
        println!("  {:<lw$}{}", "homepage", pkg.homepage);
    }
    if !pkg.license.is_empty() {
        println!("  {:<lw$}{}", "license", pkg.license);
    }
    println!("  {:<lw$}{}", "bin", desc.bin_names().join(", "));
    println!(
        "  {:<lw$}{} {}",
        "test",
        desc.smoke_args().join(" "),
        format!("(expects \"{}\")", desc.smoke_expect()).dark_grey()
    );
    println!();

    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(vec!["platform", "target", "sha256", "url"]);
    for variant in &desc.variants {
        let platform = variant.platform();
        let sha = variant.sha256.to_string();
        table.add_row(vec![
            platform.to_string(),
            platform.target_triple(),
            sha.chars().take(16).collect(),
            variant.url_for(desc.version()),
        ]);
    }
    println!("{table}");
    Ok(())
}
