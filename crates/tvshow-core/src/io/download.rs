//! Download and verification.
//!
//! Artifacts are streamed to a `.part` file while being hashed with SHA-256.
//! Only a download whose digest equals the recorded checksum is renamed to its
//! final path; a corrupted or truncated transfer leaves nothing behind.

use std::io::Read;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tvshow_schema::{PackageName, Sha256Digest, Version};

use crate::Reporter;

/// Errors raised while fetching or verifying an artifact.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The request failed or the server answered with an error status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Writing the artifact to disk failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The downloaded bytes do not hash to the recorded checksum.
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Recorded checksum.
        expected: String,
        /// Digest of the bytes actually received.
        actual: String,
    },
}

/// Request for a verified download.
pub struct DownloadRequest<'a> {
    /// Shared HTTP client.
    pub client: &'a Client,
    /// Package being fetched (for progress reporting).
    pub pkg_name: &'a PackageName,
    /// Version being fetched (for progress reporting).
    pub version: &'a Version,
    /// Artifact URL.
    pub url: &'a str,
    /// Final path of the verified artifact.
    pub dest: &'a Path,
    /// Checksum the artifact must match.
    pub expected_hash: &'a Sha256Digest,
    /// Progress sink.
    pub reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for DownloadRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("pkg_name", &self.pkg_name)
            .field("version", &self.version)
            .field("url", &self.url)
            .field("dest", &self.dest)
            .field("expected_hash", &self.expected_hash)
            .finish_non_exhaustive()
    }
}

impl DownloadRequest<'_> {
    /// Execute the download and verification.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::HashMismatch`] when the digest differs, or the
    /// underlying HTTP/IO error.
    pub async fn execute(self) -> Result<String, DownloadError> {
        download_and_verify(self).await
    }
}

/// Downloads `req.url` to `req.dest`, failing unless the bytes hash to `req.expected_hash`.
///
/// Returns the verified hex digest.
///
/// # Errors
///
/// Returns [`DownloadError::HashMismatch`] when the digest differs, or the
/// underlying HTTP/IO error.
pub async fn download_and_verify(req: DownloadRequest<'_>) -> Result<String, DownloadError> {
    let part = part_path(req.dest);
    let reporter = req.reporter;
    let (pkg_name, version) = (req.pkg_name, req.version);

    let actual_hash = stream_to_file(req.client, req.url, &part, |current, total| {
        reporter.downloading(pkg_name, version, current, total);
    })
    .await?;

    if !req.expected_hash.matches(&actual_hash) {
        reporter.failed(pkg_name, version, "hash mismatch");
        tokio::fs::remove_file(&part).await.ok();
        return Err(DownloadError::HashMismatch {
            expected: req.expected_hash.to_string(),
            actual: actual_hash,
        });
    }

    tokio::fs::rename(&part, req.dest).await?;
    Ok(actual_hash)
}

/// Download without a known checksum and return the digest of what was received.
///
/// Used when filling in checksums for a new release.
///
/// # Errors
///
/// Returns the underlying HTTP/IO error.
pub async fn download_and_hash(
    client: &Client,
    url: &str,
    dest: &Path,
) -> Result<String, DownloadError> {
    let part = part_path(dest);
    let hash = stream_to_file(client, url, &part, |_, _| {}).await?;
    tokio::fs::rename(&part, dest).await?;
    Ok(hash)
}

async fn stream_to_file(
    client: &Client,
    url: &str,
    dest: &Path,
    mut progress: impl FnMut(u64, Option<u64>),
) -> Result<String, DownloadError> {
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let total_size = response.content_length();
    progress(0, total_size);

    let written = write_body(response, dest, total_size, &mut progress).await;
    if written.is_err() {
        tokio::fs::remove_file(dest).await.ok();
    }
    written
}

/// Stream the response body into `dest`, hashing as it goes.
async fn write_body(
    response: reqwest::Response,
    dest: &Path,
    total_size: Option<u64>,
    progress: &mut impl FnMut(u64, Option<u64>),
) -> Result<String, DownloadError> {
    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        progress(downloaded, total_size);
    }

    file.flush().await?;
    tracing::debug!(path = %dest.display(), bytes = downloaded, "download complete");
    Ok(hex::encode(hasher.finalize()))
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Compute the SHA-256 of a file on disk.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut file = std::fs::File::open(path)?;
    let mut buffer = [0u8; 8192];
    loop {
        let count = file.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Check a file on disk against a recorded checksum.
///
/// # Errors
///
/// Returns [`DownloadError::HashMismatch`] when the digest differs, or an I/O error.
pub fn verify_file(path: &Path, expected: &Sha256Digest) -> Result<String, DownloadError> {
    let actual = sha256_file(path)?;
    if expected.matches(&actual) {
        Ok(actual)
    } else {
        Err(DownloadError::HashMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use mockito::Server;

    // sha256("test")
    const TEST_DIGEST: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    fn digest(s: &str) -> Sha256Digest {
        Sha256Digest::new(s).unwrap()
    }

    #[tokio::test]
    async fn verified_download_lands_at_dest() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tvshow.tar.gz")
            .with_status(200)
            .with_body("test")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tvshow.tar.gz");
        let client = Client::new();
        let url = format!("{}/tvshow.tar.gz", server.url());
        let expected = digest(TEST_DIGEST);
        let name = PackageName::from("tvshow");
        let version = Version::from("0.1.2");

        let hash = DownloadRequest {
            client: &client,
            pkg_name: &name,
            version: &version,
            url: &url,
            dest: &dest,
            expected_hash: &expected,
            reporter: &NullReporter,
        }
        .execute()
        .await
        .unwrap();

        assert_eq!(hash, TEST_DIGEST);
        assert_eq!(std::fs::read(&dest).unwrap(), b"test");
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn truncated_download_fails_and_leaves_nothing() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tvshow.tar.gz")
            .with_status(200)
            .with_body("tes")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tvshow.tar.gz");
        let client = Client::new();
        let url = format!("{}/tvshow.tar.gz", server.url());
        let expected = digest(TEST_DIGEST);
        let name = PackageName::from("tvshow");
        let version = Version::from("0.1.2");

        let err = download_and_verify(DownloadRequest {
            client: &client,
            pkg_name: &name,
            version: &version,
            url: &url,
            dest: &dest,
            expected_hash: &expected,
            reporter: &NullReporter,
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DownloadError::HashMismatch { .. }));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.tar.gz")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = Client::new();
        let url = format!("{}/missing.tar.gz", server.url());
        let err = download_and_hash(&client, &url, &dir.path().join("missing.tar.gz"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Http(_)));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn write_failure_removes_part_file() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/tvshow.tar.gz")
            .with_status(200)
            .with_body("test")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tvshow.tar.gz");
        // Every write to /dev/full fails with ENOSPC.
        std::os::unix::fs::symlink("/dev/full", part_path(&dest)).unwrap();

        let client = Client::new();
        let url = format!("{}/tvshow.tar.gz", server.url());
        let err = download_and_hash(&client, &url, &dest).await.unwrap_err();

        assert!(matches!(err, DownloadError::Io(_)));
        assert!(std::fs::symlink_metadata(part_path(&dest)).is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn verify_file_detects_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact");
        std::fs::write(&path, b"test").unwrap();
        assert!(verify_file(&path, &digest(TEST_DIGEST)).is_ok());

        std::fs::write(&path, b"tast").unwrap();
        assert!(matches!(
            verify_file(&path, &digest(TEST_DIGEST)),
            Err(DownloadError::HashMismatch { .. })
        ));
    }

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/cache/tvshow.tar.gz")),
            PathBuf::from("/cache/tvshow.tar.gz.part")
        );
    }
}
