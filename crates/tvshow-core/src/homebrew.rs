//! Homebrew formula rendering.
//!
//! Produces the Ruby formula a Homebrew tap serves for a descriptor. Variants
//! are grouped into `on_macos`/`on_linux` blocks, each holding `on_intel`
//! before `on_arm`, and URL templates become `#{version}` interpolations so
//! the formula tracks its own `version` line.

use std::fmt::Write as _;

use tvshow_schema::{Arch, Os, ReleaseDescriptor, Variant};

/// Render `desc` as a Homebrew formula.
pub fn render_formula(desc: &ReleaseDescriptor) -> String {
    let pkg = &desc.package;
    let mut out = String::new();

    let _ = writeln!(out, "class {} < Formula", class_name(&pkg.name));
    for (key, value) in [
        ("desc", pkg.description.as_str()),
        ("homepage", pkg.homepage.as_str()),
        ("version", pkg.version.as_str()),
        ("license", pkg.license.as_str()),
    ] {
        if !value.is_empty() {
            let _ = writeln!(out, "  {key} {}", quote(value));
        }
    }

    for os in [Os::MacOs, Os::Linux] {
        let variants: Vec<&Variant> = [Arch::X86_64, Arch::Arm64]
            .iter()
            .filter_map(|arch| {
                desc.variants
                    .iter()
                    .find(|v| v.os == os && v.arch == *arch)
            })
            .collect();
        if variants.is_empty() {
            continue;
        }

        let _ = writeln!(out, "\n  on_{} do", os.as_str());
        for (i, variant) in variants.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "    on_{} do", variant.arch.homebrew_name());
            let _ = writeln!(out, "      url {}", quote(&ruby_url(&variant.url)));
            let _ = writeln!(out, "      sha256 {}", quote(&variant.sha256.to_string()));
            out.push_str("    end\n");
        }
        out.push_str("  end\n");
    }

    let bins = desc.bin_names();
    let quoted: Vec<String> = bins.iter().map(|b| quote(b)).collect();
    let _ = write!(
        out,
        "\n  def install\n    bin.install {}\n  end\n",
        quoted.join(", ")
    );

    let first = bins.first().map_or(pkg.name.as_str(), String::as_str);
    let mut command = format!("#{{bin}}/{first}");
    for arg in desc.smoke_args() {
        command.push(' ');
        command.push_str(&arg);
    }
    let _ = write!(
        out,
        "\n  test do\n    assert_match {}, shell_output({})\n  end\nend\n",
        quote(&desc.smoke_expect()),
        quote(&command)
    );

    out
}

/// Homebrew class name: `tvshow` → `Tvshow`, `foo-bar` → `FooBar`.
pub fn class_name(name: &str) -> String {
    name.split(['-', '_', '.'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

fn ruby_url(template: &str) -> String {
    template
        .replace("{{tag}}", "v#{version}")
        .replace("{{version}}", "#{version}")
}

/// Ruby double-quoted string literal. `#{` is left alone so interpolations survive.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
