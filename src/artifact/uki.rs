//! Unified EFI image builder.
//!
//! Produces a single firmware-bootable executable by appending four sections
//! to a systemd-boot EFI stub with objcopy: os-release metadata, the kernel
//! command line, the kernel image, and the initramfs image.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::common::write_file_with_dirs;
use crate::kernel::KernelImage;
use crate::process::Cmd;
use crate::retention;

/// Section names and load addresses expected by the systemd-boot stub.
///
/// This table is a structural contract with the stub's PE layout: the stub
/// locates each payload by section name at these fixed virtual addresses,
/// and an image built with different offsets will not boot.
const STUB_SECTIONS: &[(&str, &str)] = &[
    (".osrel", "0x20000"),
    (".cmdline", "0x30000"),
    (".linux", "0x2000000"),
    (".initrd", "0x3000000"),
];

/// Candidate locations of the os-release file embedded as `.osrel`.
const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

/// Build a unified EFI image into the scratch area.
///
/// The stub must already exist; its absence is a precondition failure
/// reported before any tool is invoked, distinct from a build failure.
pub fn build(
    scratch: &Path,
    kernel: &KernelImage,
    initramfs: &Path,
    cmdline: &str,
    stub: &Path,
) -> Result<PathBuf> {
    if !stub.is_file() {
        bail!(
            "EFI stub not found at {} (install systemd-boot or set EFI_STUB)",
            stub.display()
        );
    }
    let os_release = OS_RELEASE_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.is_file());
    let Some(os_release) = os_release else {
        bail!("no os-release file found (tried /etc/os-release, /usr/lib/os-release)");
    };

    let cmdline_file = scratch.join("kernel-cmdline");
    write_file_with_dirs(&cmdline_file, format!("{cmdline}\n"))?;

    let output = scratch.join(retention::unified_name(&kernel.prefix, &kernel.version));
    let inputs: [&Path; 4] = [os_release, &cmdline_file, &kernel.path, initramfs];

    println!("Building unified EFI image for kernel {}...", kernel.version);
    let mut cmd = Cmd::new("objcopy");
    for ((section, vma), input) in STUB_SECTIONS.iter().zip(inputs) {
        cmd = cmd
            .arg("--add-section")
            .arg(format!("{section}={}", input.display()))
            .arg("--change-section-vma")
            .arg(format!("{section}={vma}"));
    }
    cmd.arg_path(stub)
        .arg_path(&output)
        .error_msg(format!(
            "objcopy failed building unified image for kernel {}",
            kernel.version
        ))
        .run()?;

    println!("  Created {}", output.display());
    Ok(output)
}
