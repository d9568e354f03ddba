//! Unified UI output interface.
//!
//! Commands print through [`Output`], which is also the [`Reporter`] handed to
//! the install pipeline.

use std::io::Write;

use crossterm::style::Stylize;
use tvshow_core::Reporter;
use tvshow_schema::{PackageName, Version};

use super::theme::{Theme, format_size};

/// A handle for printing styled status lines.
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
    quiet: bool,
}

impl Output {
    /// Create a new output handle.
    pub fn new(quiet: bool) -> Self {
        Self {
            theme: Theme::default(),
            quiet,
        }
    }

    fn package_line(&self, icon: &str, name: &PackageName, version: &Version, status: &str) {
        let name = format!("{name:<12}");
        println!(
            "  {} {} {:<10} {}",
            icon,
            name.with(self.theme.colors.package_name),
            version.as_str().with(self.theme.colors.secondary),
            status
        );
    }

    fn flush() {
        std::io::stdout().flush().ok();
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        println!();
        println!("{}", title.bold());
    }

    fn downloading(&self, name: &PackageName, version: &Version, current: u64, total: Option<u64>) {
        if self.quiet {
            return;
        }
        let total = total.filter(|&t| t > 0);
        match (current, total) {
            (0, Some(t)) => self.package_line(
                self.theme.icons.active,
                name,
                version,
                &format!("fetching {}", format_size(t)),
            ),
            (0, None) => self.package_line(self.theme.icons.active, name, version, "fetching"),
            (c, Some(t)) if c >= t => {
                self.package_line(self.theme.icons.active, name, version, "verifying");
            }
            _ => {}
        }
        Self::flush();
    }

    fn extracting(&self, name: &PackageName, version: &Version) {
        if !self.quiet {
            self.package_line(self.theme.icons.active, name, version, "extracting");
        }
    }

    fn installing(&self, name: &PackageName, version: &Version) {
        if !self.quiet {
            self.package_line(self.theme.icons.active, name, version, "installing");
        }
    }

    fn testing(&self, name: &PackageName, version: &Version) {
        if !self.quiet {
            self.package_line(self.theme.icons.active, name, version, "testing");
        }
    }

    fn done(&self, name: &PackageName, version: &Version, detail: &str) {
        let icon = self.theme.icons.success.with(self.theme.colors.success);
        self.package_line(&icon.to_string(), name, version, detail);
    }

    fn failed(&self, name: &PackageName, version: &Version, reason: &str) {
        let icon = self.theme.icons.error.with(self.theme.colors.error);
        let reason = reason.with(self.theme.colors.error);
        self.package_line(&icon.to_string(), name, version, &reason.to_string());
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {}", self.theme.icons.info, msg);
        }
    }

    fn success(&self, msg: &str) {
        println!(
            "{} {}",
            self.theme.icons.success.with(self.theme.colors.success),
            msg
        );
    }

    fn warning(&self, msg: &str) {
        eprintln!(
            "{} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }

    fn error(&self, msg: &str) {
        eprintln!(
            "{} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        );
    }
}
