//! Kernel image discovery.
//!
//! A managed boot directory contains kernel images named `<prefix>-<version>`
//! (`vmlinuz-6.1.9` and friends). Selection walks a fixed priority list of
//! prefixes and picks the highest version within the first prefix that
//! matches at all; an explicitly configured kernel path bypasses discovery
//! entirely.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::version;

/// Recognized kernel image name prefixes, in priority order.
///
/// The first prefix that matches any file wins; later prefixes are only
/// consulted when the earlier ones match nothing.
pub const KERNEL_PREFIXES: &[&str] = &["vmlinuz", "vmlinux", "bzImage"];

/// A selected kernel image. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct KernelImage {
    /// Full path to the image file.
    pub path: PathBuf,
    /// Filename part before the first `-` (e.g. "vmlinuz").
    pub prefix: String,
    /// Filename part after the first `-` (e.g. "6.1.9").
    pub version: String,
}

impl KernelImage {
    /// Build a KernelImage from an explicitly configured path.
    ///
    /// The file must exist: a dangling explicit path is a configuration
    /// error, not a "no kernel found" condition.
    pub fn from_path(path: &Path) -> Result<KernelImage> {
        if !path.is_file() {
            bail!("configured kernel image does not exist: {}", path.display());
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("kernel path has no usable filename: {}", path.display()))?;
        let (prefix, ver) = split_name(name)
            .with_context(|| format!("kernel filename is not <prefix>-<version>: {name}"))?;
        Ok(KernelImage {
            path: path.to_path_buf(),
            prefix: prefix.to_string(),
            version: ver.to_string(),
        })
    }
}

/// Split `<prefix>-<version>` at the first separator.
fn split_name(name: &str) -> Option<(&str, &str)> {
    let (prefix, version) = name.split_once('-')?;
    if prefix.is_empty() || version.is_empty() {
        return None;
    }
    Some((prefix, version))
}

/// Find the highest-versioned kernel image in `dir`.
///
/// Returns `Ok(None)` when no file matches any prefix; the caller decides
/// whether that is fatal.
pub fn select_latest(dir: &Path, prefixes: &[&str]) -> Result<Option<KernelImage>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("cannot read kernel directory {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }

    for prefix in prefixes {
        let mut best: Option<(String, String)> = None;
        for name in &names {
            let Some((p, ver)) = split_name(name) else {
                continue;
            };
            if p != *prefix {
                continue;
            }
            let newer = match &best {
                Some((_, best_ver)) => {
                    version::compare(ver, best_ver) == std::cmp::Ordering::Greater
                }
                None => true,
            };
            if newer {
                best = Some((name.clone(), ver.to_string()));
            }
        }
        // First prefix with any match short-circuits the fallbacks.
        if let Some((name, ver)) = best {
            return Ok(Some(KernelImage {
                path: dir.join(&name),
                prefix: prefix.to_string(),
                version: ver,
            }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_name_at_first_separator() {
        assert_eq!(split_name("vmlinuz-5.10-lts"), Some(("vmlinuz", "5.10-lts")));
        assert_eq!(split_name("vmlinuz"), None);
        assert_eq!(split_name("-5.10"), None);
        assert_eq!(split_name("vmlinuz-"), None);
    }
}
