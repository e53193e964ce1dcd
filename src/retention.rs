//! Retention and rotation of boot artifacts.
//!
//! A target directory is reconciled once per enabled mode: the freshly built
//! artifact is placed, then old copies are pruned according to the
//! directory's rotation policy. The two modes never touch each other's
//! files: unified images always carry the `.efi` suffix and the split mode
//! never matches it.
//!
//! Placement is copy-based and happens before any deletion, so a failed
//! copy costs nothing and the artifact written by this run is structurally
//! never a pruning candidate.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::common::place_file;
use crate::kernel::KernelImage;
use crate::version;

/// Reserved slot names used by the single-slot policy. Never treated as
/// versions by the versioned listing.
pub const SLOT_CURRENT: &str = "current";
pub const SLOT_BACKUP: &str = "backup";

/// How a target directory retains artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Keep up to `max_copies` version-named artifacts, pruning the oldest
    /// by version order (not file age).
    Versioned { max_copies: usize },
    /// Keep exactly two fixed-name slots, rotating current to backup before
    /// each new build.
    SingleSlotWithBackup,
}

/// What kind of artifact a filename represents within a target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactRole {
    /// Unified EFI image, `<prefix>-<version>.efi`.
    Unified,
    /// Bare kernel image, `<prefix>-<version>`.
    Kernel,
}

/// A version-named artifact currently present in a target directory.
#[derive(Debug, Clone)]
pub struct RetainedArtifact {
    pub path: PathBuf,
    pub version: String,
}

/// `<prefix>-<version>.efi`
pub fn unified_name(prefix: &str, version: &str) -> String {
    format!("{prefix}-{version}.efi")
}

/// `<prefix>-<version>`
pub fn kernel_name(prefix: &str, version: &str) -> String {
    format!("{prefix}-{version}")
}

/// `initramfs-<version>.img` — the initramfs paired with a kernel of the
/// same version.
pub fn initramfs_name(version: &str) -> String {
    format!("initramfs-{version}.img")
}

/// Extract the version from an artifact filename, or None when the name
/// does not belong to the given prefix and role.
///
/// Kept free of filesystem access so the policy logic above it is testable
/// on plain strings.
pub fn parse_artifact_name(name: &str, prefix: &str, role: ArtifactRole) -> Option<String> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('-')?;
    let version = match role {
        ArtifactRole::Unified => rest.strip_suffix(".efi")?,
        ArtifactRole::Kernel => {
            if rest.ends_with(".efi") {
                return None;
            }
            rest
        }
    };
    if version.is_empty() || version == SLOT_CURRENT || version == SLOT_BACKUP {
        return None;
    }
    Some(version.to_string())
}

/// List the version-named artifacts of one role in `dir`, oldest first.
///
/// `exclude_version` drops the version this run is about to write, which is
/// what guarantees the fresh artifact can never be pruned.
pub fn list_retained(
    dir: &Path,
    prefix: &str,
    role: ArtifactRole,
    exclude_version: Option<&str>,
) -> Result<Vec<RetainedArtifact>> {
    let mut retained = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(retained),
        Err(e) => {
            return Err(e).with_context(|| format!("cannot read target directory {}", dir.display()))
        }
    };
    for entry in entries {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(ver) = parse_artifact_name(&name, prefix, role) else {
            continue;
        };
        if exclude_version == Some(ver.as_str()) {
            continue;
        }
        retained.push(RetainedArtifact {
            path: entry.path(),
            version: ver,
        });
    }
    retained.sort_by(|a, b| version::compare(&a.version, &b.version));
    Ok(retained)
}

/// Remove a file, tolerating its absence.
fn remove_existing(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("cannot remove {}", path.display())),
    }
}

/// How many of the existing artifacts must go so that existing + the one
/// just written fit within `max_copies`.
fn excess_count(existing: usize, max_copies: usize) -> usize {
    // The new artifact always occupies one slot, whatever the count says.
    let keep = max_copies.max(1) - 1;
    existing.saturating_sub(keep)
}

/// Reconcile a unified-EFI target directory.
///
/// Returns the path the new image was placed at.
pub fn reconcile_unified(
    dir: &Path,
    policy: RotationPolicy,
    prefix: &str,
    version: &str,
    new_image: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create target directory {}", dir.display()))?;

    match policy {
        RotationPolicy::Versioned { max_copies } => {
            let existing = list_retained(dir, prefix, ArtifactRole::Unified, Some(version))?;

            let dest = dir.join(unified_name(prefix, version));
            place_file(new_image, &dest)?;
            println!("  Installed {}", dest.display());

            for old in existing.iter().take(excess_count(existing.len(), max_copies)) {
                println!("  Removing old unified image {}", old.path.display());
                remove_existing(&old.path)?;
            }
            Ok(dest)
        }
        RotationPolicy::SingleSlotWithBackup => {
            let current = dir.join(unified_name(prefix, SLOT_CURRENT));
            let backup = dir.join(unified_name(prefix, SLOT_BACKUP));
            rotate_to_backup(&current, &backup);

            place_file(new_image, &current)?;
            println!("  Installed {}", current.display());
            Ok(current)
        }
    }
}

/// Reconcile a split kernel+initramfs target directory.
///
/// Returns the paths the kernel and initramfs were placed at. All pruning
/// is paired: removing a kernel always removes the initramfs of the same
/// version, and an already-absent half of the pair is tolerated.
pub fn reconcile_components(
    dir: &Path,
    policy: RotationPolicy,
    kernel: &KernelImage,
    new_initramfs: &Path,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create target directory {}", dir.display()))?;

    match policy {
        RotationPolicy::Versioned { max_copies } => {
            let existing = list_retained(
                dir,
                &kernel.prefix,
                ArtifactRole::Kernel,
                Some(kernel.version.as_str()),
            )?;

            let kernel_dest = dir.join(kernel_name(&kernel.prefix, &kernel.version));
            let initramfs_dest = dir.join(initramfs_name(&kernel.version));
            place_file(&kernel.path, &kernel_dest)?;
            place_file(new_initramfs, &initramfs_dest)?;
            println!("  Installed {}", kernel_dest.display());
            println!("  Installed {}", initramfs_dest.display());

            for old in existing.iter().take(excess_count(existing.len(), max_copies)) {
                println!(
                    "  Removing old kernel {} and its initramfs",
                    old.path.display()
                );
                remove_existing(&old.path)?;
                remove_existing(&dir.join(initramfs_name(&old.version)))?;
            }
            Ok((kernel_dest, initramfs_dest))
        }
        RotationPolicy::SingleSlotWithBackup => {
            let kernel_current = dir.join(kernel_name(&kernel.prefix, SLOT_CURRENT));
            let kernel_backup = dir.join(kernel_name(&kernel.prefix, SLOT_BACKUP));
            rotate_to_backup(&kernel_current, &kernel_backup);

            let initramfs_current = dir.join(initramfs_name(SLOT_CURRENT));
            let initramfs_backup = dir.join(initramfs_name(SLOT_BACKUP));
            rotate_to_backup(&initramfs_current, &initramfs_backup);

            place_file(&kernel.path, &kernel_current)?;
            place_file(new_initramfs, &initramfs_current)?;
            println!("  Installed {}", kernel_current.display());
            println!("  Installed {}", initramfs_current.display());
            Ok((kernel_current, initramfs_current))
        }
    }
}

/// Copy `current` over `backup` if `current` exists.
///
/// A failed backup copy is reported but does not stop the new build from
/// being placed; the copy (never a rename) keeps the old current intact
/// until the new one has actually landed.
fn rotate_to_backup(current: &Path, backup: &Path) {
    if !current.exists() {
        return;
    }
    match place_file(current, backup) {
        Ok(()) => println!("  Backed up {} -> {}", current.display(), backup.display()),
        Err(e) => eprintln!("[WARN] backup of {} failed: {e:#}", current.display()),
    }
}
