//! Preflight checks.
//!
//! Validates host tools and preconditions before the first managed run:
//! the external build tools, the mount helpers, the EFI stub, and the
//! configured directories. Run with `bootkeep preflight`.

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::Config;

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed.
    Pass,
    /// Check failed - a managed run will fail.
    Fail,
    /// Check passed but with a warning.
    Warn,
}

impl CheckResult {
    fn pass(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details.to_string()),
        }
    }

    fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }

    fn warn(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details.to_string()),
        }
    }
}

/// Results of all preflight checks.
pub struct PreflightReport {
    pub checks: Vec<CheckResult>,
}

impl PreflightReport {
    /// Returns true if no check failed.
    pub fn all_passed(&self) -> bool {
        !self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("=== Preflight Check Results ===\n");
        for check in &self.checks {
            let (icon, status) = match check.status {
                CheckStatus::Pass => ("✓", "PASS"),
                CheckStatus::Fail => ("✗", "FAIL"),
                CheckStatus::Warn => ("⚠", "WARN"),
            };
            print!("  {} [{}] {}", icon, status, check.name);
            match &check.details {
                Some(details) => println!(": {}", details),
                None => println!(),
            }
        }

        let failed = self
            .checks
            .iter()
            .filter(|c| c.status == CheckStatus::Fail)
            .count();
        println!();
        println!(
            "Summary: {}/{} passed",
            self.checks.len() - failed,
            self.checks.len()
        );
        if failed > 0 {
            println!("         {failed} FAILED - a managed run will not succeed");
        }
    }
}

fn check_tool(name: &str, package_hint: &str, required: bool) -> CheckResult {
    match which::which(name) {
        Ok(path) => CheckResult::pass(name, &path.display().to_string()),
        Err(_) if required => {
            CheckResult::fail(name, &format!("not found in PATH (install {package_hint})"))
        }
        Err(_) => CheckResult::warn(name, &format!("not found in PATH (install {package_hint})")),
    }
}

fn check_dir(name: &str, path: &Path, required: bool) -> CheckResult {
    if path.is_dir() {
        CheckResult::pass(name, &path.display().to_string())
    } else if required {
        CheckResult::fail(name, &format!("{} does not exist", path.display()))
    } else {
        CheckResult::warn(name, &format!("{} does not exist", path.display()))
    }
}

/// Run all preflight checks for the given configuration.
pub fn run_preflight(config: &Config) -> PreflightReport {
    let mut checks = Vec::new();

    println!("Checking host tools...");
    checks.push(check_tool("dracut", "dracut", true));
    checks.push(check_tool("mount", "util-linux", true));
    checks.push(check_tool("umount", "util-linux", true));
    if config.efi.is_some() {
        checks.push(check_tool("objcopy", "binutils", true));
    }

    println!("Checking configuration...");
    if !config.managed {
        checks.push(CheckResult::warn(
            "MANAGED",
            "management is disabled; runs will exit without doing anything",
        ));
    }
    checks.push(check_dir("boot mount", &config.boot_mount, true));
    checks.push(check_dir("kernel directory", &config.kernel_dir, true));
    checks.push(check_dir("dracut conf directory", &config.dracut_conf_dir, false));

    if config.efi.is_some() {
        if config.efi_stub.is_file() {
            checks.push(CheckResult::pass(
                "EFI stub",
                &config.efi_stub.display().to_string(),
            ));
        } else {
            checks.push(CheckResult::fail(
                "EFI stub",
                &format!("{} does not exist", config.efi_stub.display()),
            ));
        }
        let os_release_found = ["/etc/os-release", "/usr/lib/os-release"]
            .iter()
            .any(|p| Path::new(p).is_file());
        if os_release_found {
            checks.push(CheckResult::pass("os-release", "found"));
        } else {
            checks.push(CheckResult::fail(
                "os-release",
                "neither /etc/os-release nor /usr/lib/os-release exists",
            ));
        }
    }

    if config.efi.is_none() && config.components.is_none() {
        checks.push(CheckResult::warn(
            "rotation modes",
            "neither EFI_ENABLED nor COMPONENTS_ENABLED is set; a run builds images but places nothing",
        ));
    }

    println!();
    PreflightReport { checks }
}

/// Execute the preflight command.
pub fn cmd_preflight(config: &Config, strict: bool) -> Result<()> {
    let report = run_preflight(config);
    report.print();
    if strict && !report.all_passed() {
        bail!("preflight checks failed");
    }
    Ok(())
}
