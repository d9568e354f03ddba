//! Archive extraction module
//!
//! Handles tar.gz, tar, zip, and bare executables.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

/// Errors raised while unpacking an artifact.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Reading the archive or writing its contents failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The archive is corrupt or contains unsafe entries.
    #[error("Archive error: {0}")]
    Archive(String),
}

/// Archive or binary format of a downloadable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tar archive (`.tar.gz` / `.tgz`).
    TarGz,
    /// Uncompressed tar archive (`.tar`).
    Tar,
    /// Zip archive (`.zip`).
    Zip,
    /// Standalone executable with no archive wrapper.
    Binary,
}

/// Information about an extracted file
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path relative to extraction root
    pub relative_path: PathBuf,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
    /// Whether this is an executable
    pub is_executable: bool,
}

/// Extract a tar.gz archive to a destination directory
///
/// # Errors
///
/// Returns an error if the archive cannot be read or contains unsafe paths.
pub fn extract_tar_gz(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let gz_decoder = flate2::read::GzDecoder::new(reader);

    extract_tar(gz_decoder, dest_dir)
}

/// Extract a tar archive from a reader
fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<Vec<ExtractedFile>, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    let mut extracted_files = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_type = entry.header().entry_type();

        // Only regular files are of interest; links could point outside dest_dir
        if !entry_type.is_file() {
            continue;
        }

        let relative_path = sanitize(&entry.path()?)?;
        let absolute_path = dest_dir.join(&relative_path);

        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }

        entry.unpack(&absolute_path)?;

        let is_executable = entry
            .header()
            .mode()
            .map(|m| m & 0o111 != 0)
            .unwrap_or(false);

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}

/// Reject absolute paths and `..` components.
fn sanitize(path: &Path) -> Result<PathBuf, ExtractError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => {
                return Err(ExtractError::Archive(format!(
                    "Invalid path in archive: {}",
                    path.display()
                )));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(ExtractError::Archive("Empty path in archive".to_string()));
    }
    Ok(clean)
}

/// Extract a zip archive
///
/// # Errors
///
/// Returns an error if the archive cannot be read.
pub fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        let Some(relative_path) = file.enclosed_name() else {
            continue;
        };

        if file.is_dir() {
            fs::create_dir_all(dest_dir.join(&relative_path))?;
            continue;
        }

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        let is_executable = if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
            mode & 0o111 != 0
        } else {
            false
        };
        #[cfg(not(unix))]
        let is_executable = false;

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}

/// Detect archive format from file extension
pub fn detect_format(path: &Path) -> ArchiveFormat {
    let path_str = path.to_string_lossy().to_lowercase();

    if path_str.ends_with(".tar.gz") || path_str.ends_with(".tgz") {
        ArchiveFormat::TarGz
    } else if path_str.ends_with(".tar") {
        ArchiveFormat::Tar
    } else if path_str.ends_with(".zip") {
        ArchiveFormat::Zip
    } else {
        ArchiveFormat::Binary
    }
}

/// Extract an archive, auto-detecting format from `name`.
///
/// `name` is the artifact's original file name; the cached copy may be stored
/// under a different name.
///
/// # Errors
///
/// Returns an error if the archive cannot be read or contains unsafe paths.
pub fn extract_auto(
    archive_path: &Path,
    name: &str,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    match detect_format(Path::new(name)) {
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArchiveFormat::Tar => {
            let file = File::open(archive_path)?;
            extract_tar(BufReader::new(file), dest_dir)
        }
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
        ArchiveFormat::Binary => {
            fs::create_dir_all(dest_dir)?;
            let filename = Path::new(name)
                .file_name()
                .ok_or_else(|| ExtractError::Archive("Invalid filename".to_string()))?;
            let dest_path = dest_dir.join(filename);
            fs::copy(archive_path, &dest_path)?;

            Ok(vec![ExtractedFile {
                relative_path: PathBuf::from(filename),
                absolute_path: dest_path,
                is_executable: true, // Assume raw binaries are executable
            }])
        }
    }
}

/// Pick the extracted file called `name`.
///
/// Release tarballs either hold the binary at the top level or inside a single
/// versioned directory; the shallowest match wins.
pub fn find_binary<'a>(files: &'a [ExtractedFile], name: &str) -> Option<&'a ExtractedFile> {
    files
        .iter()
        .filter(|f| f.relative_path.file_name().is_some_and(|n| n == name))
        .min_by_key(|f| f.relative_path.components().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8], u32)]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data, mode) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_entry_type(tar::EntryType::Regular);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format(Path::new("tvshow-x86_64-apple-darwin.tar.gz")),
            ArchiveFormat::TarGz
        );
        assert_eq!(detect_format(Path::new("foo.tgz")), ArchiveFormat::TarGz);
        assert_eq!(detect_format(Path::new("FOO.ZIP")), ArchiveFormat::Zip);
        assert_eq!(detect_format(Path::new("archive.tar")), ArchiveFormat::Tar);
        assert_eq!(detect_format(Path::new("tvshow")), ArchiveFormat::Binary);
    }

    #[test]
    fn test_extract_tar_gz_keeps_exec_bit() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("tvshow.tar.gz");
        write_tar_gz(
            &archive,
            &[
                ("tvshow", b"#!/bin/sh\necho tvshow\n", 0o755),
                ("README.md", b"docs", 0o644),
            ],
        );

        let dest = dir.path().join("out");
        let files = extract_auto(&archive, "tvshow.tar.gz", &dest).unwrap();

        assert_eq!(files.len(), 2);
        let bin = files
            .iter()
            .find(|f| f.relative_path == Path::new("tvshow"))
            .unwrap();
        assert!(bin.is_executable);
        assert!(dest.join("tvshow").exists());
    }

    #[test]
    fn test_extract_corrupt_archive_fails() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.tar.gz");
        fs::write(&archive, b"definitely not gzip").unwrap();

        let result = extract_auto(&archive, "broken.tar.gz", &dir.path().join("out"));
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize(Path::new("../evil")).is_err());
        assert!(sanitize(Path::new("/etc/passwd")).is_err());
        assert_eq!(
            sanitize(Path::new("./tvshow-0.1.2/tvshow")).unwrap(),
            PathBuf::from("tvshow-0.1.2/tvshow")
        );
    }

    #[test]
    fn test_extract_raw_binary() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("cached-blob");
        fs::write(&src, b"binary content").unwrap();

        let dest = dir.path().join("extracted");
        let files = extract_auto(&src, "tvshow", &dest).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path.to_str(), Some("tvshow"));
        assert!(files[0].absolute_path.starts_with(&dest));
    }

    #[test]
    fn test_find_binary_prefers_shallowest() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("tvshow.tar.gz");
        write_tar_gz(
            &archive,
            &[
                ("tvshow-0.1.2/doc/tvshow", b"doc", 0o644),
                ("tvshow-0.1.2/tvshow", b"bin", 0o755),
            ],
        );
        let files = extract_auto(&archive, "tvshow.tar.gz", &dir.path().join("out")).unwrap();

        let found = find_binary(&files, "tvshow").unwrap();
        assert_eq!(found.relative_path, Path::new("tvshow-0.1.2/tvshow"));
        assert!(found.is_executable);
        assert!(find_binary(&files, "missing").is_none());
    }

    #[test]
    fn test_extract_plain_tar() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("tvshow.tar");
        let mut builder = tar::Builder::new(File::create(&archive).unwrap());
        let data = b"#!/bin/sh\necho tvshow\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();
        builder
            .append_data(&mut header, "bin/tvshow", &data[..])
            .unwrap();
        builder.into_inner().unwrap();

        let dest = dir.path().join("out");
        let files = extract_auto(&archive, "tvshow.tar", &dest).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].is_executable);
        assert_eq!(fs::read(dest.join("bin/tvshow")).unwrap(), data);
    }

    fn write_zip(path: &Path, entries: &[(&str, &[u8], u32)]) {
        use std::io::Write;
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data, mode) in entries {
            let options = zip::write::SimpleFileOptions::default().unix_permissions(*mode);
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_extract_zip_keeps_exec_bit() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("tvshow.zip");
        write_zip(
            &archive,
            &[
                ("tvshow-0.1.2/tvshow", b"#!/bin/sh\necho tvshow\n", 0o755),
                ("tvshow-0.1.2/LICENSE", b"MIT", 0o644),
            ],
        );

        let dest = dir.path().join("out");
        let files = extract_auto(&archive, "tvshow.zip", &dest).unwrap();
        assert_eq!(files.len(), 2);

        let bin = find_binary(&files, "tvshow").unwrap();
        assert_eq!(bin.absolute_path, dest.join("tvshow-0.1.2/tvshow"));
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            assert!(bin.is_executable);
            let mode = fs::metadata(&bin.absolute_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_zip_entries_outside_dest_are_skipped() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(
            &archive,
            &[("../escaped", b"owned", 0o644), ("tvshow", b"bin", 0o755)],
        );

        let dest = dir.path().join("nested/out");
        let files = extract_auto(&archive, "evil.zip", &dest).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, Path::new("tvshow"));
        assert!(!dir.path().join("nested/escaped").exists());
    }
}
