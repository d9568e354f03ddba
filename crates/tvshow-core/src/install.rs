//! Install pipeline.
//!
//! `select → download → verify → extract → place → record → smoke-test`
//!
//! Every step before placing binaries works in the cache or a staging
//! directory, so any failure up to that point leaves `bin/` untouched. A
//! verified artifact is kept in the cache and reused by later installs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use thiserror::Error;
use tvshow_schema::{
    DescriptorError, Platform, ReleaseDescriptor, ReleaseUrl, ResolvedVariant, Sha256Digest,
};

use crate::io::download::{self, DownloadError, DownloadRequest};
use crate::io::extract::{self, ExtractError};
use crate::paths::Layout;
use crate::receipt::Receipt;
use crate::reporter::Reporter;
use crate::smoke::{self, SmokeReport, SmokeTestError};

/// Errors raised by the install pipeline.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The descriptor has no variant for the requested platform.
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform {
        /// Requested operating system.
        os: String,
        /// Requested architecture.
        arch: String,
    },

    /// The variant's checksum is still the placeholder.
    #[error("checksum for {0} is not set; run `tvshow-tap checksum --write` first")]
    ChecksumPending(Platform),

    /// The artifact could not be fetched.
    #[error("download failed: {0}")]
    Download(DownloadError),

    /// The artifact does not hash to the recorded checksum.
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Artifact URL.
        url: String,
        /// Recorded checksum.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// The artifact could not be unpacked.
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// A binary named by the install step is not in the artifact.
    #[error("binary '{0}' not found in artifact")]
    MissingBinary(String),

    /// The installed binary failed its smoke test.
    #[error("smoke test failed: {0}")]
    SmokeTest(#[from] SmokeTestError),

    /// The package has no install receipt.
    #[error("{0} is not installed")]
    NotInstalled(String),

    /// The descriptor is invalid.
    #[error("invalid descriptor: {0}")]
    Descriptor(DescriptorError),

    /// Filesystem error in the prefix.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A blocking task panicked.
    #[error("task failed: {0}")]
    Task(String),
}

impl From<DescriptorError> for InstallError {
    fn from(e: DescriptorError) -> Self {
        match e {
            DescriptorError::UnsupportedPlatform { os, arch } => {
                Self::UnsupportedPlatform { os, arch }
            }
            other => Self::Descriptor(other),
        }
    }
}

impl From<DownloadError> for InstallError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::HashMismatch { expected, actual } => Self::ChecksumMismatch {
                url: String::new(),
                expected,
                actual,
            },
            other => Self::Download(other),
        }
    }
}

impl InstallError {
    fn with_url(self, url: &str) -> Self {
        match self {
            Self::ChecksumMismatch {
                expected, actual, ..
            } => Self::ChecksumMismatch {
                url: url.to_string(),
                expected,
                actual,
            },
            other => other,
        }
    }
}

/// Knobs for a single install.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Reinstall even if a matching receipt exists.
    pub force: bool,
    /// Run the descriptor's smoke test after installing.
    pub run_test: bool,
    /// Time the smoke test may run.
    pub smoke_timeout: Duration,
    /// Resolve only; touch neither network nor disk.
    pub dry_run: bool,
    /// Base URL replacing the release host (e.g. an internal mirror).
    pub mirror: Option<String>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            force: false,
            run_test: true,
            smoke_timeout: smoke::DEFAULT_TIMEOUT,
            dry_run: false,
            mirror: None,
        }
    }
}

/// Result of [`Installer::install`].
#[derive(Debug, Clone)]
pub enum InstallOutcome {
    /// The package was installed (or reinstalled).
    Installed(Receipt),
    /// A receipt for exactly this artifact already exists; nothing was done.
    AlreadyInstalled(Receipt),
    /// Dry run: the variant that would be installed.
    DryRun(ResolvedVariant),
}

/// Installs descriptor variants into a [`Layout`].
pub struct Installer {
    client: Client,
    layout: Layout,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl Installer {
    /// Create an installer writing into `layout`.
    pub fn new(client: Client, layout: Layout, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            client,
            layout,
            reporter,
        }
    }

    /// Prefix this installer writes into.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Install the variant of `desc` for `platform`.
    ///
    /// Re-running an install whose receipt matches the same version and
    /// checksum is a no-op unless [`InstallOptions::force`] is set.
    ///
    /// # Errors
    ///
    /// Returns an [`InstallError`] naming the step that failed. Failures before
    /// binaries are placed leave the prefix's `bin/` unchanged.
    pub async fn install(
        &self,
        desc: &ReleaseDescriptor,
        platform: Platform,
        opts: &InstallOptions,
    ) -> Result<InstallOutcome, InstallError> {
        desc.validate()?;
        let mut resolved = desc.select(platform)?;
        if let Some(mirror) = &opts.mirror {
            resolved.url = apply_mirror(&resolved.url, mirror);
        }

        if opts.dry_run {
            return Ok(InstallOutcome::DryRun(resolved));
        }

        let digest = resolved
            .checksum
            .digest()
            .cloned()
            .ok_or(InstallError::ChecksumPending(platform))?;

        let name = desc.name();
        let version = desc.version();

        if !opts.force {
            if let Some(receipt) = self.load_receipt(name).await? {
                if receipt.is_current(version, digest.as_str()) {
                    if opts.run_test && !receipt.tested {
                        self.run_recorded_test(desc, receipt.clone(), opts.smoke_timeout)
                            .await?;
                    }
                    tracing::info!(%name, %version, "already installed");
                    self.reporter.done(name, version, "already installed");
                    return Ok(InstallOutcome::AlreadyInstalled(receipt));
                }
            }
        }

        self.layout.ensure()?;

        let artifact = self.fetch(desc, &resolved, &digest).await?;

        self.reporter.extracting(name, version);
        let bins = desc.bin_names();
        let layout = self.layout.clone();
        let artifact_name = resolved.artifact.clone();
        let files = tokio::task::spawn_blocking(move || {
            stage_and_place(&layout, &artifact, &artifact_name, &bins)
        })
        .await
        .map_err(|e| InstallError::Task(e.to_string()))??;
        self.reporter.installing(name, version);

        let mut receipt = Receipt {
            name: name.clone(),
            version: version.clone(),
            platform,
            url: resolved.url.clone(),
            sha256: digest.to_string(),
            files,
            installed_at: Utc::now(),
            tested: false,
        };
        self.save_receipt(receipt.clone()).await?;
        tracing::info!(%name, %version, %platform, "installed");

        if opts.run_test {
            receipt = self
                .run_recorded_test(desc, receipt, opts.smoke_timeout)
                .await?;
        }

        self.reporter.done(name, version, &platform.to_string());
        Ok(InstallOutcome::Installed(receipt))
    }

    /// Smoke-test the installed binary and mark `receipt` as tested on success.
    ///
    /// A failure leaves the receipt untested, so the next install re-runs the test.
    async fn run_recorded_test(
        &self,
        desc: &ReleaseDescriptor,
        mut receipt: Receipt,
        timeout: Duration,
    ) -> Result<Receipt, InstallError> {
        if let Err(e) = self.smoke_test(desc, timeout).await {
            self.reporter
                .failed(desc.name(), desc.version(), &e.to_string());
            return Err(e);
        }
        receipt.tested = true;
        self.save_receipt(receipt.clone()).await?;
        Ok(receipt)
    }

    async fn load_receipt(&self, name: &str) -> Result<Option<Receipt>, InstallError> {
        let layout = self.layout.clone();
        let name = name.to_string();
        let receipt = tokio::task::spawn_blocking(move || Receipt::load(&layout, &name))
            .await
            .map_err(|e| InstallError::Task(e.to_string()))??;
        Ok(receipt)
    }

    async fn save_receipt(&self, receipt: Receipt) -> Result<(), InstallError> {
        let layout = self.layout.clone();
        tokio::task::spawn_blocking(move || receipt.save(&layout))
            .await
            .map_err(|e| InstallError::Task(e.to_string()))??;
        Ok(())
    }

    /// Fetch the artifact into the cache, reusing a verified cached copy.
    async fn fetch(
        &self,
        desc: &ReleaseDescriptor,
        resolved: &ResolvedVariant,
        digest: &Sha256Digest,
    ) -> Result<PathBuf, InstallError> {
        let cached = self.layout.cache_dir().join(format!(
            "{}-{}",
            &digest.as_str()[..16],
            resolved.artifact
        ));

        if cached.is_file() {
            let path = cached.clone();
            let expected = digest.clone();
            let verified =
                tokio::task::spawn_blocking(move || download::verify_file(&path, &expected))
                    .await
                    .map_err(|e| InstallError::Task(e.to_string()))?;
            match verified {
                Ok(_) => {
                    tracing::debug!(path = %cached.display(), "using cached artifact");
                    return Ok(cached);
                }
                Err(e) => {
                    self.reporter
                        .warning(&format!("discarding cached {}: {e}", resolved.artifact));
                    tokio::fs::remove_file(&cached).await?;
                }
            }
        }

        DownloadRequest {
            client: &self.client,
            pkg_name: desc.name(),
            version: desc.version(),
            url: &resolved.url,
            dest: &cached,
            expected_hash: digest,
            reporter: self.reporter.as_ref(),
        }
        .execute()
        .await
        .map_err(|e| InstallError::from(e).with_url(&resolved.url))?;

        Ok(cached)
    }

    /// Run the descriptor's smoke test against the installed binary.
    ///
    /// A pass is recorded in the install receipt.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::NotInstalled`] if the binary is missing, or
    /// [`InstallError::SmokeTest`] if the test fails.
    pub async fn test(
        &self,
        desc: &ReleaseDescriptor,
        timeout: Duration,
    ) -> Result<SmokeReport, InstallError> {
        let report = self.smoke_test(desc, timeout).await?;
        if let Some(mut receipt) = self.load_receipt(desc.name()).await? {
            if !receipt.tested {
                receipt.tested = true;
                self.save_receipt(receipt).await?;
            }
        }
        Ok(report)
    }

    async fn smoke_test(
        &self,
        desc: &ReleaseDescriptor,
        timeout: Duration,
    ) -> Result<SmokeReport, InstallError> {
        let bins = desc.bin_names();
        let first = bins.first().cloned().unwrap_or_else(|| desc.name().to_string());
        let binary = self.layout.bin_dir().join(&first);
        if !binary.is_file() {
            return Err(InstallError::NotInstalled(first));
        }

        self.reporter.testing(desc.name(), desc.version());
        let args = desc.smoke_args();
        let expect = desc.smoke_expect();
        let report = tokio::task::spawn_blocking(move || {
            smoke::run_smoke_test(&binary, &args, &expect, timeout)
        })
        .await
        .map_err(|e| InstallError::Task(e.to_string()))??;
        Ok(report)
    }

    /// Remove an installed package's binaries and receipt.
    ///
    /// Returns the removed receipt, or `None` if nothing was installed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a file cannot be removed.
    pub fn uninstall(&self, name: &str) -> Result<Option<Receipt>, InstallError> {
        let Some(receipt) = Receipt::load(&self.layout, name)? else {
            return Ok(None);
        };
        for file in &receipt.files {
            match fs::remove_file(file) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        Receipt::remove(&self.layout, name)?;
        tracing::info!(%name, "uninstalled");
        Ok(Some(receipt))
    }

    /// Current install receipt for `name`, if any.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the receipt exists but cannot be read.
    pub fn status(&self, name: &str) -> Result<Option<Receipt>, InstallError> {
        Ok(Receipt::load(&self.layout, name)?)
    }
}

/// Point a release URL at a mirror that serves the same
/// `<owner>/<repo>/releases/download/<tag>/<artifact>` paths.
pub fn apply_mirror(url: &str, mirror: &str) -> String {
    match ReleaseUrl::parse(url) {
        Some(parsed) => {
            tracing::debug!(from = %parsed.host, to = mirror, "using mirror");
            format!(
                "{}/{}/{}/releases/download/{}/{}",
                mirror.trim_end_matches('/'),
                parsed.owner,
                parsed.repo,
                parsed.tag,
                parsed.artifact
            )
        }
        None => url.to_string(),
    }
}

/// Unpack `artifact` in a staging directory, then move each binary into `bin/`.
///
/// Every binary is located before any is placed, so a missing one leaves
/// `bin/` untouched.
fn stage_and_place(
    layout: &Layout,
    artifact: &Path,
    artifact_name: &str,
    bins: &[String],
) -> Result<Vec<PathBuf>, InstallError> {
    let staging = tempfile::Builder::new()
        .prefix("tvshow-")
        .tempdir_in(layout.tmp_dir())?;

    let extracted = extract::extract_auto(artifact, artifact_name, staging.path())?;
    tracing::debug!(files = extracted.len(), "unpacked {artifact_name}");

    let sources = bins
        .iter()
        .map(|bin| {
            extract::find_binary(&extracted, bin)
                .map(|file| (bin, file.absolute_path.clone()))
                .ok_or_else(|| InstallError::MissingBinary(bin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let bin_dir = layout.bin_dir();
    sources
        .into_iter()
        .map(|(bin, src)| place_binary(&src, &bin_dir, bin).map_err(InstallError::from))
        .collect()
}

/// Copy `src` to `bin_dir/name` via a temporary file and rename.
///
/// The temporary file is removed if any step fails.
fn place_binary(src: &Path, bin_dir: &Path, name: &str) -> io::Result<PathBuf> {
    let dest = bin_dir.join(name);
    let tmp = bin_dir.join(format!(".{name}.tmp"));

    let placed = copy_executable(src, &tmp).and_then(|()| fs::rename(&tmp, &dest));
    if let Err(e) = placed {
        fs::remove_file(&tmp).ok();
        return Err(e);
    }
    Ok(dest)
}

fn copy_executable(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dest, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}
