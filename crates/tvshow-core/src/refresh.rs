//! Descriptor maintenance: filling in checksums and bumping versions.
//!
//! Edits go through `toml_edit` so comments, ordering and templated URLs in
//! the hand-written descriptor survive.

use std::path::Path;

use reqwest::Client;
use thiserror::Error;
use toml_edit::{DocumentMut, Item, Table, value};
use tvshow_schema::{
    Arch, CHECKSUM_PLACEHOLDER, DescriptorError, Os, Platform, ReleaseDescriptor, Sha256Digest,
    Version,
};

use crate::install::apply_mirror;
use crate::io::download::{self, DownloadError};

/// Errors raised while editing a descriptor.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// The descriptor is not valid TOML.
    #[error("TOML error: {0}")]
    Toml(#[from] toml_edit::TomlError),

    /// A required table or key is missing.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A variant has an unrecognized `os` or `arch`.
    #[error("invalid variant: {0}")]
    InvalidVariant(String),

    /// The new version is not a semantic version.
    #[error("invalid version '{0}'")]
    InvalidVersion(String),

    /// No variant targets a platform an update was given for.
    #[error("no variant for {0}")]
    UnknownPlatform(Platform),

    /// The descriptor failed to resolve.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Fetching an artifact failed.
    #[error("failed to fetch {url}: {source}")]
    Download {
        /// Artifact URL.
        url: String,
        /// Underlying error.
        source: DownloadError,
    },

    /// A computed digest was rejected.
    #[error("invalid digest: {0}")]
    Digest(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `updates` into the `sha256` keys of the matching `[[variant]]` tables.
///
/// # Errors
///
/// Returns an error if the content is not a descriptor or an update names a
/// platform with no variant.
pub fn set_checksums(
    content: &str,
    updates: &[(Platform, Sha256Digest)],
) -> Result<String, RefreshError> {
    let mut doc = content.parse::<DocumentMut>()?;
    let variants = variant_tables(&mut doc)?;

    for (platform, digest) in updates {
        let mut found = false;
        for table in variants.iter_mut() {
            if table_platform(table)? == *platform {
                table["sha256"] = value(digest.as_str());
                found = true;
            }
        }
        if !found {
            return Err(RefreshError::UnknownPlatform(*platform));
        }
    }

    Ok(doc.to_string())
}

/// Move the descriptor to `new_version`.
///
/// Literal `v<old>` tags in URLs are rewritten, templated URLs are left alone,
/// and every checksum is reset to the placeholder since the artifacts change.
///
/// # Errors
///
/// Returns an error if the content is not a descriptor or the version is not semver.
pub fn bump_version(content: &str, new_version: &Version) -> Result<String, RefreshError> {
    if new_version.semver().is_none() {
        return Err(RefreshError::InvalidVersion(new_version.to_string()));
    }

    let mut doc = content.parse::<DocumentMut>()?;
    let old = doc
        .get("package")
        .and_then(|p| p.get("version"))
        .and_then(Item::as_str)
        .ok_or(RefreshError::MissingField("package.version"))?
        .to_string();
    doc["package"]["version"] = value(new_version.as_str());

    let old_tag = Version::from(old.as_str()).tag();
    let new_tag = new_version.tag();
    for table in variant_tables(&mut doc)?.iter_mut() {
        if let Some(url) = table.get("url").and_then(Item::as_str) {
            if url.contains(&old_tag) {
                let rewritten = url.replace(&old_tag, &new_tag);
                table["url"] = value(rewritten);
            }
        }
        table["sha256"] = value(CHECKSUM_PLACEHOLDER);
    }

    tracing::info!(from = %old, to = %new_version, "bumped descriptor version");
    Ok(doc.to_string())
}

/// Download each variant's artifact and return its SHA-256.
///
/// With `pending_only`, variants that already carry a checksum are skipped.
///
/// # Errors
///
/// Returns the first download failure.
pub async fn compute_checksums(
    client: &Client,
    desc: &ReleaseDescriptor,
    pending_only: bool,
    mirror: Option<&str>,
) -> Result<Vec<(Platform, Sha256Digest)>, RefreshError> {
    let scratch = tempfile::tempdir()?;
    let mut computed = Vec::new();

    for variant in &desc.variants {
        if pending_only && !variant.sha256.is_pending() {
            continue;
        }
        let resolved = desc.select(variant.platform())?;
        let url = match mirror {
            Some(m) => apply_mirror(&resolved.url, m),
            None => resolved.url,
        };

        tracing::info!(platform = %resolved.platform, %url, "hashing artifact");
        let dest = scratch.path().join(&resolved.artifact);
        let hash = download::download_and_hash(client, &url, &dest)
            .await
            .map_err(|source| RefreshError::Download {
                url: url.clone(),
                source,
            })?;
        let digest = Sha256Digest::new(hash).map_err(|e| RefreshError::Digest(e.to_string()))?;
        computed.push((resolved.platform, digest));
    }

    Ok(computed)
}

/// Compute missing checksums and write them back into the descriptor file.
///
/// Returns the platforms that were updated.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, fetched or written.
pub async fn refresh_checksums(
    client: &Client,
    path: &Path,
    all: bool,
    mirror: Option<&str>,
) -> Result<Vec<(Platform, Sha256Digest)>, RefreshError> {
    let content = tokio::fs::read_to_string(path).await?;
    let desc = ReleaseDescriptor::parse(&content)?;
    let updates = compute_checksums(client, &desc, !all, mirror).await?;
    if !updates.is_empty() {
        tokio::fs::write(path, set_checksums(&content, &updates)?).await?;
    }
    Ok(updates)
}

fn variant_tables(
    doc: &mut DocumentMut,
) -> Result<&mut toml_edit::ArrayOfTables, RefreshError> {
    doc.get_mut("variant")
        .and_then(Item::as_array_of_tables_mut)
        .ok_or(RefreshError::MissingField("variant"))
}

fn table_platform(table: &Table) -> Result<Platform, RefreshError> {
    let field = |key: &'static str| {
        table
            .get(key)
            .and_then(Item::as_str)
            .ok_or(RefreshError::MissingField(key))
    };
    let os: Os = field("os")?.parse().map_err(RefreshError::InvalidVariant)?;
    let arch: Arch = field("arch")?
        .parse()
        .map_err(RefreshError::InvalidVariant)?;
    Ok(Platform::new(os, arch))
}
