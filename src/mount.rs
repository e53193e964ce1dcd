//! Scoped acquisition of the boot mount.
//!
//! Artifact placement needs the boot partition mounted, but the run must not
//! unmount a partition somebody else mounted. The guard checks /proc/mounts,
//! mounts the target itself only when absent (relying on fstab for the
//! device), and releases exactly what it acquired — on drop, on explicit
//! release, or from the signal path via [`crate::cleanup`].
//!
//! A failed mount is a warning, not an error: if the partition really is
//! inaccessible, placement failures will surface on their own.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cleanup;
use crate::process::Cmd;

/// Guard over the boot mount for the duration of one run.
pub struct MountGuard {
    mount_point: PathBuf,
}

impl MountGuard {
    /// Ensure `mount_point` is mounted, recording ownership only if this
    /// call performed the mount.
    pub fn acquire(mount_point: &Path) -> MountGuard {
        let mounts = fs::read_to_string("/proc/mounts").unwrap_or_default();
        if mounts_contain(&mounts, mount_point) {
            println!("{} is already mounted", mount_point.display());
        } else {
            match Cmd::new("mount").arg_path(mount_point).allow_fail().run() {
                Ok(result) if result.success() => {
                    println!("Mounted {}", mount_point.display());
                    cleanup::register_mount(mount_point);
                }
                Ok(result) => {
                    eprintln!(
                        "[WARN] could not mount {}: {}",
                        mount_point.display(),
                        result.stderr_trimmed()
                    );
                }
                Err(e) => {
                    eprintln!("[WARN] could not mount {}: {e:#}", mount_point.display());
                }
            }
        }
        MountGuard {
            mount_point: mount_point.to_path_buf(),
        }
    }

    /// True if this run performed the mount and has not yet released it.
    pub fn owns_mount(&self) -> bool {
        cleanup::mount_owned()
    }

    /// Unmount if owned. Safe to call any number of times.
    pub fn release(&self) {
        if cleanup::release_mount() {
            println!("Unmounted {}", self.mount_point.display());
        }
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Check whether `target` appears as a mount point in /proc/mounts text.
///
/// The mount point is the second whitespace-separated field; the kernel
/// escapes space, tab, newline and backslash as octal sequences.
fn mounts_contain(mounts: &str, target: &Path) -> bool {
    let target = target.to_string_lossy();
    mounts
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|point| unescape_mount_point(point) == target)
}

fn unescape_mount_point(point: &str) -> String {
    let mut out = String::with_capacity(point.len());
    let mut chars = point.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let digits: String = chars.clone().take(3).collect();
        match digits.as_str() {
            "040" => out.push(' '),
            "011" => out.push('\t'),
            "012" => out.push('\n'),
            "134" => out.push('\\'),
            _ => {
                out.push(c);
                continue;
            }
        }
        for _ in 0..3 {
            chars.next();
        }
    }
    out
}
