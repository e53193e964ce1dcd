//! Initramfs builder.
//!
//! Thin wrapper around dracut. The image is generated into the scratch area
//! and named `initramfs-<version>.img`; nothing is placed into a target
//! directory here, so a failed build leaves the boot environment untouched.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::process::Cmd;
use crate::retention;

/// Build an initramfs for `kernel_version` into the scratch area.
///
/// A non-zero dracut exit is fatal to the run; the error carries the
/// captured tool output.
pub fn build(scratch: &Path, kernel_version: &str, conf_dir: &Path) -> Result<PathBuf> {
    let output = scratch.join(retention::initramfs_name(kernel_version));

    println!("Building initramfs for kernel {kernel_version}...");
    Cmd::new("dracut")
        .arg("--force")
        .arg("--confdir")
        .arg_path(conf_dir)
        .arg("--kver")
        .arg(kernel_version)
        .arg_path(&output)
        .error_msg(format!("dracut failed for kernel {kernel_version}"))
        .run()?;

    println!("  Created {}", output.display());
    Ok(output)
}
