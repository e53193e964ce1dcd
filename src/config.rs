//! Configuration management for bootkeep.
//!
//! The configuration is a flat KEY=value file (shell-assignment style:
//! `#` comments, optional single or double quotes around values). A missing
//! file is fatal before any side effect; every key has a default so a
//! two-line file enabling one mode is a complete configuration.
//!
//! Relative target paths resolve under the boot mount point.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::retention::RotationPolicy;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/bootkeep.conf";

/// Default EFI stub installed by systemd-boot.
pub const DEFAULT_EFI_STUB: &str = "/usr/lib/systemd/boot/efi/linuxx64.efi.stub";

/// Settings for one rotation mode (unified-EFI or split kernel+initramfs).
#[derive(Debug, Clone)]
pub struct ModeConfig {
    /// Target directory the mode reconciles.
    pub dir: PathBuf,
    /// Rotation policy for that directory.
    pub policy: RotationPolicy,
}

/// Settings for boot menu generation.
#[derive(Debug, Clone)]
pub struct MenuConfig {
    /// Final path of the generated menu file.
    pub path: PathBuf,
    /// Menu title line.
    pub title: String,
    /// Menu timeout in tenths of a second.
    pub timeout: u32,
}

/// The effective configuration, constructed once at startup and passed by
/// reference; no component reads ambient state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Master toggle; off means a clean early exit, not an error.
    pub managed: bool,
    /// Boot partition mount point.
    pub boot_mount: PathBuf,
    /// Directory searched for kernel images.
    pub kernel_dir: PathBuf,
    /// Explicit kernel image path; bypasses discovery when set.
    pub kernel: Option<PathBuf>,
    /// dracut configuration directory.
    pub dracut_conf_dir: PathBuf,
    /// Kernel command line for unified images and menu entries.
    pub cmdline: String,
    /// EFI stub the unified image is built on.
    pub efi_stub: PathBuf,
    /// Unified-EFI mode, when enabled.
    pub efi: Option<ModeConfig>,
    /// Split kernel+initramfs mode, when enabled.
    pub components: Option<ModeConfig>,
    /// Menu generation, when a path is configured.
    pub menu: Option<MenuConfig>,
}

impl Config {
    /// Load the configuration file. A missing or unreadable file is fatal.
    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Parse configuration text.
    pub fn parse(content: &str) -> Result<Config> {
        let mut vars = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();
                // Remove quotes if present
                let value = value.trim_matches('"').trim_matches('\'');
                vars.insert(key.to_string(), value.to_string());
            }
        }

        let boot_mount = PathBuf::from(vars.get("BOOT_MOUNT").map(String::as_str).unwrap_or("/boot"));
        let resolve = |value: &str| -> PathBuf {
            let path = PathBuf::from(value);
            if path.is_absolute() {
                path
            } else {
                boot_mount.join(path)
            }
        };

        let kernel_dir = vars
            .get("KERNEL_DIR")
            .map(|v| resolve(v))
            .unwrap_or_else(|| boot_mount.clone());

        let efi = if get_bool(&vars, "EFI_ENABLED", false) {
            Some(ModeConfig {
                dir: vars
                    .get("EFI_DIR")
                    .map(|v| resolve(v))
                    .unwrap_or_else(|| boot_mount.join("EFI/Linux")),
                policy: mode_policy(&vars, "EFI_VERSIONED", "EFI_MAX_COPIES")?,
            })
        } else {
            None
        };

        let components = if get_bool(&vars, "COMPONENTS_ENABLED", false) {
            Some(ModeConfig {
                dir: vars
                    .get("COMPONENTS_DIR")
                    .map(|v| resolve(v))
                    .unwrap_or_else(|| boot_mount.clone()),
                policy: mode_policy(&vars, "COMPONENTS_VERSIONED", "COMPONENTS_MAX_COPIES")?,
            })
        } else {
            None
        };

        let menu = match vars.get("MENU_PATH") {
            Some(path) if !path.is_empty() => Some(MenuConfig {
                path: resolve(path),
                title: vars
                    .get("MENU_TITLE")
                    .cloned()
                    .unwrap_or_else(|| "Boot Menu".to_string()),
                timeout: match vars.get("MENU_TIMEOUT") {
                    Some(raw) => raw
                        .parse()
                        .with_context(|| format!("MENU_TIMEOUT is not a number: {raw}"))?,
                    None => 50,
                },
            }),
            _ => None,
        };

        Ok(Config {
            managed: get_bool(&vars, "MANAGED", false),
            boot_mount,
            kernel_dir,
            kernel: vars.get("KERNEL").filter(|v| !v.is_empty()).map(PathBuf::from),
            dracut_conf_dir: PathBuf::from(
                vars.get("DRACUT_CONF_DIR")
                    .map(String::as_str)
                    .unwrap_or("/etc/dracut.conf.d"),
            ),
            cmdline: vars.get("CMDLINE").cloned().unwrap_or_default(),
            efi_stub: PathBuf::from(
                vars.get("EFI_STUB").map(String::as_str).unwrap_or(DEFAULT_EFI_STUB),
            ),
            efi,
            components,
            menu,
        })
    }

    /// Print the effective configuration.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  MANAGED: {}", if self.managed { "yes" } else { "no" });
        println!("  BOOT_MOUNT: {}", self.boot_mount.display());
        println!("  KERNEL_DIR: {}", self.kernel_dir.display());
        match &self.kernel {
            Some(path) => println!("  KERNEL: {} (discovery bypassed)", path.display()),
            None => println!("  KERNEL: (newest in KERNEL_DIR)"),
        }
        println!("  DRACUT_CONF_DIR: {}", self.dracut_conf_dir.display());
        println!("  CMDLINE: {}", self.cmdline);
        print_mode("unified EFI", &self.efi);
        if self.efi.is_some() {
            println!("    stub: {}", self.efi_stub.display());
        }
        print_mode("kernel+initramfs", &self.components);
        match &self.menu {
            Some(menu) => println!(
                "  menu: {} (title \"{}\", timeout {})",
                menu.path.display(),
                menu.title,
                menu.timeout
            ),
            None => println!("  menu: disabled"),
        }
    }
}

fn print_mode(name: &str, mode: &Option<ModeConfig>) {
    match mode {
        Some(mode) => {
            let policy = match mode.policy {
                RotationPolicy::Versioned { max_copies } => {
                    format!("versioned, {max_copies} copies")
                }
                RotationPolicy::SingleSlotWithBackup => "current+backup slots".to_string(),
            };
            println!("  {name}: {} ({policy})", mode.dir.display());
        }
        None => println!("  {name}: disabled"),
    }
}

fn get_bool(vars: &HashMap<String, String>, key: &str, default: bool) -> bool {
    match vars.get(key) {
        Some(value) => matches!(value.to_ascii_lowercase().as_str(), "yes" | "true" | "1"),
        None => default,
    }
}

fn mode_policy(
    vars: &HashMap<String, String>,
    versioned_key: &str,
    copies_key: &str,
) -> Result<RotationPolicy> {
    if !get_bool(vars, versioned_key, true) {
        return Ok(RotationPolicy::SingleSlotWithBackup);
    }
    let max_copies = match vars.get(copies_key) {
        Some(raw) => {
            let n: usize = raw
                .parse()
                .with_context(|| format!("{copies_key} is not a number: {raw}"))?;
            if n == 0 {
                bail!("{copies_key} must be at least 1");
            }
            n
        }
        None => 2,
    };
    Ok(RotationPolicy::Versioned { max_copies })
}
