//! Run command - the once-per-kernel-update lifecycle pass.
//!
//! Select a kernel, build its initramfs (and unified EFI image when that
//! mode is on), reconcile each enabled target directory, regenerate the
//! menu. Build and selection failures abort the whole run; a reconciliation
//! failure is scoped to its mode so the other mode and the menu still get
//! their turn, and the run exits non-zero at the end.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::artifact;
use crate::config::Config;
use crate::kernel::{self, KernelImage};
use crate::menu;
use crate::mount::MountGuard;
use crate::retention;
use crate::scratch::ScratchDir;

/// Execute the run command.
///
/// `explicit_kernel` (the --kernel flag) takes precedence over the KERNEL
/// configuration key; either bypasses discovery.
pub fn cmd_run(config: &Config, explicit_kernel: Option<&Path>) -> Result<()> {
    // Guard first, scratch second: drop order removes the scratch area
    // before the unmount.
    let guard = MountGuard::acquire(&config.boot_mount);
    let scratch = ScratchDir::create()?;

    let kernel = match explicit_kernel.or(config.kernel.as_deref()) {
        Some(path) => KernelImage::from_path(path)?,
        None => kernel::select_latest(&config.kernel_dir, kernel::KERNEL_PREFIXES)?
            .with_context(|| {
                format!("no kernel image found in {}", config.kernel_dir.display())
            })?,
    };
    println!(
        "Selected kernel {} (version {})",
        kernel.path.display(),
        kernel.version
    );

    let initramfs =
        artifact::initramfs::build(scratch.path(), &kernel.version, &config.dracut_conf_dir)?;

    let mut failed_modes: Vec<&str> = Vec::new();

    if let Some(efi) = &config.efi {
        let image = artifact::uki::build(
            scratch.path(),
            &kernel,
            &initramfs,
            &config.cmdline,
            &config.efi_stub,
        )?;
        println!("Rotating unified EFI images in {}...", efi.dir.display());
        if let Err(e) =
            retention::reconcile_unified(&efi.dir, efi.policy, &kernel.prefix, &kernel.version, &image)
        {
            eprintln!("[WARN] unified EFI rotation failed: {e:#}");
            failed_modes.push("unified-EFI");
        }
    }

    if let Some(components) = &config.components {
        println!(
            "Rotating kernel+initramfs copies in {}...",
            components.dir.display()
        );
        if let Err(e) =
            retention::reconcile_components(&components.dir, components.policy, &kernel, &initramfs)
        {
            eprintln!("[WARN] kernel+initramfs rotation failed: {e:#}");
            failed_modes.push("kernel+initramfs");
        }
    }

    if let Some(menu_config) = &config.menu {
        match &config.components {
            Some(components) => {
                println!("Regenerating boot menu...");
                if let Err(e) = menu::generate(
                    scratch.path(),
                    &components.dir,
                    &kernel.prefix,
                    &config.boot_mount,
                    &config.cmdline,
                    menu_config,
                ) {
                    eprintln!("[WARN] menu generation failed: {e:#}");
                    failed_modes.push("menu");
                }
            }
            None => println!(
                "Skipping menu generation: the kernel+initramfs mode it lists is disabled"
            ),
        }
    }

    drop(scratch);
    guard.release();

    if !failed_modes.is_empty() {
        bail!("run finished with failures: {}", failed_modes.join(", "));
    }
    println!("Boot images for kernel {} are in place.", kernel.version);
    Ok(())
}
