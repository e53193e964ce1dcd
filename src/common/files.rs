//! File placement helpers.
//!
//! All movement of artifacts into target directories is copy-based: the
//! source stays intact until the copy has landed, so a failed placement
//! never costs an existing good file. Rename is deliberately not offered.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Copy `src` to `dest`, creating `dest`'s parent directories as needed.
pub fn place_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create directory {}", parent.display()))?;
    }
    fs::copy(src, dest)
        .with_context(|| format!("copy {} -> {} failed", src.display(), dest.display()))?;
    Ok(())
}

/// Write a file, creating parent directories as needed.
pub fn write_file_with_dirs<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, content: C) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_file_creates_parents_and_keeps_source() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.img");
        fs::write(&src, b"payload").unwrap();

        let dest = tmp.path().join("boot/EFI/Linux/out.img");
        place_file(&src, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"payload");
        assert!(src.exists());
    }

    #[test]
    fn place_file_fails_on_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let err = place_file(&tmp.path().join("absent"), &tmp.path().join("out")).unwrap_err();
        assert!(err.to_string().contains("copy"));
    }
}
