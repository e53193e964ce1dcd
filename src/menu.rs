//! Boot menu generation.
//!
//! The menu is derived in full from the split kernel+initramfs artifacts a
//! target directory retains after reconciliation; it is never patched
//! incrementally. Each retained version becomes one extlinux-style entry,
//! newest first, with the newest marked default. The rendered text goes to
//! the scratch area first and is copy-placed at its final path, so a reader
//! never sees a half-written menu.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::common::place_file;
use crate::config::MenuConfig;
use crate::retention;
use crate::version;

/// One selectable menu entry.
#[derive(Debug, Clone)]
pub struct MenuEntry {
    /// Machine label, e.g. "linux-5.10".
    pub label: String,
    /// Human-readable title, e.g. "Linux 5.10".
    pub menu_label: String,
    /// Kernel path relative to the bootloader's root.
    pub kernel: String,
    /// Initrd path relative to the bootloader's root.
    pub initrd: String,
    /// Kernel command line.
    pub append: String,
}

/// A path as the bootloader sees it: relative to the boot mount, with a
/// leading slash.
fn boot_relative(path: &Path, boot_mount: &Path) -> String {
    match path.strip_prefix(boot_mount) {
        Ok(rel) => format!("/{}", rel.display()),
        Err(_) => path.display().to_string(),
    }
}

/// Enumerate the bootable kernel+initramfs pairs in `dir`, newest first.
///
/// Unlike the pruning listing this one includes the fixed current/backup
/// slots, so single-slot directories produce a two-entry menu. A kernel
/// whose paired initramfs is missing is skipped: the menu must never offer
/// an entry that cannot boot.
pub fn collect_entries(
    dir: &Path,
    prefix: &str,
    boot_mount: &Path,
    cmdline: &str,
) -> Result<Vec<MenuEntry>> {
    let mut versions = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
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
        let Some(rest) = name.strip_prefix(prefix).and_then(|r| r.strip_prefix('-')) else {
            continue;
        };
        if rest.is_empty() || rest.ends_with(".efi") {
            continue;
        }
        versions.push((rest.to_string(), entry.path()));
    }
    versions.sort_by(|a, b| version::compare(&b.0, &a.0));

    let mut menu = Vec::new();
    for (ver, kernel_path) in versions {
        let initramfs_path = dir.join(retention::initramfs_name(&ver));
        if !initramfs_path.is_file() {
            eprintln!(
                "[WARN] {} has no initramfs, not adding it to the menu",
                kernel_path.display()
            );
            continue;
        }
        menu.push(MenuEntry {
            label: format!("linux-{ver}"),
            menu_label: format!("Linux {ver}"),
            kernel: boot_relative(&kernel_path, boot_mount),
            initrd: boot_relative(&initramfs_path, boot_mount),
            append: cmdline.to_string(),
        });
    }
    Ok(menu)
}

/// Render the menu text: one header block, then one block per entry.
pub fn render(title: &str, timeout: u32, entries: &[MenuEntry]) -> String {
    let mut out = String::new();
    out.push_str("# Generated by bootkeep; regenerated on every kernel update. Do not edit.\n");
    if let Some(first) = entries.first() {
        out.push_str(&format!("DEFAULT {}\n", first.label));
    }
    out.push_str(&format!("MENU TITLE {title}\n"));
    out.push_str("PROMPT 0\n");
    out.push_str(&format!("TIMEOUT {timeout}\n"));

    for entry in entries {
        out.push('\n');
        out.push_str(&format!("LABEL {}\n", entry.label));
        out.push_str(&format!("  MENU LABEL {}\n", entry.menu_label));
        out.push_str(&format!("  LINUX {}\n", entry.kernel));
        out.push_str(&format!("  INITRD {}\n", entry.initrd));
        out.push_str(&format!("  APPEND {}\n", entry.append));
    }
    out
}

/// Regenerate the menu file from the retained set in `dir`.
pub fn generate(
    scratch: &Path,
    dir: &Path,
    prefix: &str,
    boot_mount: &Path,
    cmdline: &str,
    menu: &MenuConfig,
) -> Result<PathBuf> {
    let entries = collect_entries(dir, prefix, boot_mount, cmdline)?;
    if entries.is_empty() {
        eprintln!(
            "[WARN] no bootable kernel+initramfs pairs in {}, writing an empty menu",
            dir.display()
        );
    }

    let staged = scratch.join("menu.conf");
    fs::write(&staged, render(&menu.title, menu.timeout, &entries))
        .with_context(|| format!("cannot write staged menu {}", staged.display()))?;
    place_file(&staged, &menu.path)?;

    println!(
        "  Wrote boot menu {} ({} entries)",
        menu.path.display(),
        entries.len()
    );
    Ok(menu.path.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ver: &str) -> MenuEntry {
        MenuEntry {
            label: format!("linux-{ver}"),
            menu_label: format!("Linux {ver}"),
            kernel: format!("/vmlinuz-{ver}"),
            initrd: format!("/initramfs-{ver}.img"),
            append: "root=/dev/sda2 rw".to_string(),
        }
    }

    #[test]
    fn newest_entry_is_default() {
        let text = render("Boot Menu", 50, &[entry("5.10"), entry("5.4")]);
        assert!(text.starts_with("# Generated by bootkeep"));
        assert!(text.contains("DEFAULT linux-5.10\n"));
        assert_eq!(text.matches("DEFAULT ").count(), 1);
        assert_eq!(text.matches("LABEL linux-").count(), 2);
        // Newest block comes first.
        let pos_new = text.find("LABEL linux-5.10").unwrap();
        let pos_old = text.find("LABEL linux-5.4").unwrap();
        assert!(pos_new < pos_old);
    }

    #[test]
    fn empty_menu_has_header_only() {
        let text = render("Boot Menu", 50, &[]);
        assert!(!text.contains("DEFAULT"));
        assert!(text.contains("MENU TITLE Boot Menu\n"));
        assert!(text.contains("TIMEOUT 50\n"));
    }

    #[test]
    fn boot_relative_strips_the_mount_prefix() {
        assert_eq!(
            boot_relative(Path::new("/boot/vmlinuz-5.10"), Path::new("/boot")),
            "/vmlinuz-5.10"
        );
        assert_eq!(
            boot_relative(Path::new("/boot/EFI/vmlinuz-5.10"), Path::new("/boot")),
            "/EFI/vmlinuz-5.10"
        );
        // Outside the mount the path is passed through unchanged.
        assert_eq!(
            boot_relative(Path::new("/srv/vmlinuz-5.10"), Path::new("/boot")),
            "/srv/vmlinuz-5.10"
        );
    }
}
