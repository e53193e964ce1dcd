//! Menu command - regenerate the boot menu without building anything.
//!
//! Recovers a hand-edited or damaged menu file from the artifacts currently
//! retained in the kernel+initramfs target directory.

use anyhow::{bail, Context, Result};

use crate::config::Config;
use crate::kernel;
use crate::menu;
use crate::mount::MountGuard;
use crate::scratch::ScratchDir;

/// Execute the menu command.
pub fn cmd_menu(config: &Config) -> Result<()> {
    let Some(menu_config) = &config.menu else {
        bail!("no MENU_PATH configured, nothing to regenerate");
    };
    let Some(components) = &config.components else {
        bail!("the kernel+initramfs mode the menu lists is disabled (COMPONENTS_ENABLED)");
    };

    let guard = MountGuard::acquire(&config.boot_mount);
    let scratch = ScratchDir::create()?;

    // The retained set names its own prefix; discover it from the newest
    // kernel in the target directory.
    let retained = kernel::select_latest(&components.dir, kernel::KERNEL_PREFIXES)?
        .with_context(|| {
            format!(
                "no retained kernel images in {}",
                components.dir.display()
            )
        })?;

    println!("Regenerating boot menu from {}...", components.dir.display());
    menu::generate(
        scratch.path(),
        &components.dir,
        &retained.prefix,
        &config.boot_mount,
        &config.cmdline,
        menu_config,
    )?;

    drop(scratch);
    guard.release();
    Ok(())
}
