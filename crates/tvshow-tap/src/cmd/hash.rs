//! Hash command

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Print the SHA-256 of each file, one `<digest>  <path>` line per file
pub fn hash(files: &[PathBuf]) -> Result<()> {
    for path in files {
        let digest = tvshow_core::io::download::sha256_file(path)
            .with_context(|| format!("Failed to hash {}", path.display()))?;
        println!("{digest}  {}", path.display());
    }
    Ok(())
}
