//! Release descriptor parsing and validation.
//!
//! A descriptor is the declarative recipe for one release: package metadata,
//! one downloadable artifact per platform, which file to install and how to
//! smoke-test it. It is authored per release and never mutated at install time.
//!
//! ```toml
//! [package]
//! name = "tvshow"
//! version = "0.1.2"
//!
//! [[variant]]
//! os = "macos"
//! arch = "arm64"
//! url = "https://github.com/Doarakko/tvshow/releases/download/v{{version}}/tvshow-aarch64-apple-darwin.tar.gz"
//! sha256 = "PLACEHOLDER"
//!
//! [install]
//! bin = ["tvshow"]
//!
//! [test]
//! args = ["--help"]
//! expect = "tvshow"
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arch::{Arch, Os, Platform};
use crate::hash::Checksum;
use crate::release_url::ReleaseUrl;
use crate::types::{PackageName, Version};

/// Errors that can occur when loading, validating or resolving a descriptor.
#[derive(Error, Debug)]
pub enum DescriptorError {
    /// An I/O error occurred while reading a descriptor file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be deserialized into a descriptor.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required field is empty.
    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    /// The version is not a semantic version.
    #[error("Invalid version '{0}': expected a semantic version such as 0.1.2")]
    InvalidVersion(String),

    /// The descriptor declares no variants at all.
    #[error("Descriptor declares no platform variants")]
    NoVariants,

    /// Two variants target the same platform.
    #[error("Duplicate variant for {0}")]
    DuplicateVariant(Platform),

    /// A variant URL is malformed or not a release-download URL.
    #[error("Invalid URL for {platform}: {reason} ({url})")]
    InvalidUrl {
        /// Platform of the offending variant.
        platform: Platform,
        /// The expanded URL.
        url: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A variant URL embeds a different version than the descriptor.
    #[error("Version mismatch for {platform}: descriptor is {expected}, URL embeds {found}")]
    VersionMismatch {
        /// Platform of the offending variant.
        platform: Platform,
        /// The descriptor's version.
        expected: String,
        /// The version found in the URL.
        found: String,
    },

    /// A variant's artifact name does not mention its target triple.
    #[error("Artifact '{artifact}' for {platform} does not name target {triple}")]
    ArtifactMismatch {
        /// Platform of the offending variant.
        platform: Platform,
        /// Artifact file name.
        artifact: String,
        /// Expected target triple.
        triple: String,
    },

    /// An install entry is not a plain file name.
    #[error("Invalid binary name '{0}': must be a plain file name")]
    InvalidBin(String),

    /// No variant matches the requested platform.
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform {
        /// Requested operating system.
        os: String,
        /// Requested architecture.
        arch: String,
    },
}

/// Metadata describing a package's identity and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Unique name of the package; also the default binary name.
    pub name: PackageName,
    /// Semantic version string for the release.
    pub version: Version,
    /// Short human-readable summary of the package.
    #[serde(default)]
    pub description: String,
    /// URL of the project's homepage.
    #[serde(default)]
    pub homepage: String,
    /// SPDX license identifier for the package.
    #[serde(default)]
    pub license: String,
}

/// A prebuilt artifact for one platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    /// Target operating system.
    pub os: Os,
    /// Target architecture.
    pub arch: Arch,
    /// Download URL; may contain `{{version}}` and `{{tag}}` placeholders.
    pub url: String,
    /// Expected SHA-256 of the downloaded artifact.
    #[serde(default)]
    pub sha256: Checksum,
}

impl Variant {
    /// The (OS, architecture) pair this variant targets.
    pub fn platform(&self) -> Platform {
        Platform::new(self.os, self.arch)
    }

    /// Expand URL placeholders against a version.
    pub fn url_for(&self, version: &Version) -> String {
        expand_template(&self.url, version)
    }
}

/// Expand `{{version}}` and `{{tag}}` placeholders.
pub fn expand_template(template: &str, version: &Version) -> String {
    template
        .replace("{{version}}", version.as_str())
        .replace("{{tag}}", &version.tag())
}

/// Install step: which files from the artifact go into the binaries directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallStep {
    /// Files to install to bin/ (defaults to the package name)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin: Option<Vec<String>>,
}

/// Smoke test: run the installed binary and look for a substring in its output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestStep {
    /// Arguments passed to the binary (defaults to `--help`).
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Substring the output must contain (defaults to the package name).
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,
}

/// Complete release descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    /// Core metadata for the package (name, version, description, etc.).
    pub package: PackageInfo,
    /// Platform-specific download targets.
    #[serde(rename = "variant", default)]
    pub variants: Vec<Variant>,
    /// Install instructions.
    #[serde(default)]
    pub install: InstallStep,
    /// Post-install smoke test.
    #[serde(default)]
    pub test: TestStep,
}

/// A variant selected for a concrete platform, with its URL expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    /// Platform the variant was selected for.
    pub platform: Platform,
    /// Fully expanded download URL.
    pub url: String,
    /// Expected SHA-256 of the artifact.
    pub checksum: Checksum,
    /// Artifact file name (last URL segment).
    pub artifact: String,
}

impl ReleaseDescriptor {
    /// Parse a descriptor from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::Io` if the file cannot be read, or
    /// `DescriptorError::Parse` if the TOML content is invalid.
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a descriptor from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `DescriptorError::Parse` if the TOML content is invalid or does
    /// not match the expected schema.
    pub fn parse(content: &str) -> Result<Self, DescriptorError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize this descriptor to a pretty-printed TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `toml::ser::Error` if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Package name.
    pub fn name(&self) -> &PackageName {
        &self.package.name
    }

    /// Release version.
    pub fn version(&self) -> &Version {
        &self.package.version
    }

    /// Binaries to place into the binaries directory.
    pub fn bin_names(&self) -> Vec<String> {
        self.install
            .bin
            .clone()
            .filter(|bins| !bins.is_empty())
            .unwrap_or_else(|| vec![self.package.name.to_string()])
    }

    /// Arguments for the smoke test.
    pub fn smoke_args(&self) -> Vec<String> {
        self.test
            .args
            .clone()
            .unwrap_or_else(|| vec!["--help".to_string()])
    }

    /// Substring the smoke test expects in the binary's output.
    pub fn smoke_expect(&self) -> String {
        self.test
            .expect
            .clone()
            .unwrap_or_else(|| self.package.name.to_string())
    }

    /// Platforms this release ships artifacts for.
    pub fn platforms(&self) -> Vec<Platform> {
        self.variants.iter().map(Variant::platform).collect()
    }

    /// Variants whose checksum is still the placeholder.
    pub fn pending_checksums(&self) -> Vec<Platform> {
        self.variants
            .iter()
            .filter(|v| v.sha256.is_pending())
            .map(Variant::platform)
            .collect()
    }

    /// Select the variant for `platform`.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::UnsupportedPlatform`] if no variant targets it.
    pub fn select(&self, platform: Platform) -> Result<ResolvedVariant, DescriptorError> {
        let variant = self
            .variants
            .iter()
            .find(|v| v.platform() == platform)
            .ok_or_else(|| DescriptorError::UnsupportedPlatform {
                os: platform.os.to_string(),
                arch: platform.arch.to_string(),
            })?;

        let url = variant.url_for(&self.package.version);
        let artifact = url.rsplit('/').next().unwrap_or_default().to_string();

        Ok(ResolvedVariant {
            platform,
            url,
            checksum: variant.sha256.clone(),
            artifact,
        })
    }

    /// Check the descriptor's invariants.
    ///
    /// Pending checksums are allowed here; see [`Self::pending_checksums`].
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.package.name.is_empty() {
            return Err(DescriptorError::EmptyField("package.name"));
        }
        if self.package.version.is_empty() {
            return Err(DescriptorError::EmptyField("package.version"));
        }
        if self.package.version.semver().is_none() {
            return Err(DescriptorError::InvalidVersion(
                self.package.version.to_string(),
            ));
        }
        if self.variants.is_empty() {
            return Err(DescriptorError::NoVariants);
        }

        let mut seen = HashSet::new();
        for variant in &self.variants {
            let platform = variant.platform();
            if !seen.insert(platform) {
                return Err(DescriptorError::DuplicateVariant(platform));
            }
            self.validate_variant(variant)?;
        }

        if let Some(bin) = self
            .bin_names()
            .into_iter()
            .find(|b| b.is_empty() || b.contains('/') || b == "..")
        {
            return Err(DescriptorError::InvalidBin(bin));
        }

        Ok(())
    }

    fn validate_variant(&self, variant: &Variant) -> Result<(), DescriptorError> {
        let platform = variant.platform();
        let url = variant.url_for(&self.package.version);

        if !url.starts_with("https://") {
            return Err(DescriptorError::InvalidUrl {
                platform,
                url,
                reason: "must use https",
            });
        }

        let Some(parsed) = ReleaseUrl::parse(&url) else {
            return Err(DescriptorError::InvalidUrl {
                platform,
                url,
                reason: "not a releases/download URL",
            });
        };

        if parsed.version() != self.package.version.as_str() {
            return Err(DescriptorError::VersionMismatch {
                platform,
                expected: self.package.version.to_string(),
                found: parsed.version().to_string(),
            });
        }

        let triple = platform.target_triple();
        if !parsed.artifact.contains(&triple) {
            return Err(DescriptorError::ArtifactMismatch {
                platform,
                artifact: parsed.artifact,
                triple,
            });
        }

        Ok(())
    }
}

impl std::str::FromStr for ReleaseDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
