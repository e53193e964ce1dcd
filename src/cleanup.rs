//! Process-wide cleanup state shared between normal exit and signal delivery.
//!
//! The run owns at most two resources that must not outlive it: the boot
//! mount (only if this run performed the mount) and the scratch directory.
//! Both the guards' `Drop` impls and the SIGINT/SIGTERM handler funnel into
//! the same idempotent release functions here, so whichever path runs first
//! wins and the other becomes a no-op.
//!
//! State is held in `OnceLock` + `AtomicBool` statics: the signal handler
//! takes no locks and allocates nothing.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

static SCRATCH_PATH: OnceLock<PathBuf> = OnceLock::new();
static SCRATCH_LIVE: AtomicBool = AtomicBool::new(false);

static MOUNT_POINT: OnceLock<PathBuf> = OnceLock::new();
static MOUNT_OWNED: AtomicBool = AtomicBool::new(false);

/// Record the scratch directory for removal on any exit path.
///
/// Only the first registration sticks; one scratch area exists per run.
pub fn register_scratch(path: &Path) {
    if SCRATCH_PATH.set(path.to_path_buf()).is_ok() {
        SCRATCH_LIVE.store(true, Ordering::SeqCst);
    }
}

/// Recursively remove the registered scratch directory. Idempotent.
pub fn remove_scratch() {
    if SCRATCH_LIVE.swap(false, Ordering::SeqCst) {
        if let Some(path) = SCRATCH_PATH.get() {
            let _ = fs::remove_dir_all(path);
        }
    }
}

/// Record that this run mounted the boot partition and owns the unmount.
pub fn register_mount(point: &Path) {
    if MOUNT_POINT.set(point.to_path_buf()).is_ok() {
        MOUNT_OWNED.store(true, Ordering::SeqCst);
    }
}

/// True while this run owns an unreleased mount.
pub fn mount_owned() -> bool {
    MOUNT_OWNED.load(Ordering::SeqCst)
}

/// Unmount the boot partition if and only if this run mounted it.
///
/// Returns true when an unmount was actually attempted. The owned flag is
/// cleared with an atomic swap, so concurrent or repeated callers (guard
/// drop, explicit release, signal handler) race safely and at most one
/// unmount runs.
pub fn release_mount() -> bool {
    if !MOUNT_OWNED.swap(false, Ordering::SeqCst) {
        return false;
    }
    if let Some(point) = MOUNT_POINT.get() {
        let _ = Command::new("umount").arg(point).status();
    }
    true
}

/// Release everything. Called from the signal handler and usable as a
/// last-resort hook on fatal paths.
pub fn run_all() {
    release_mount();
    remove_scratch();
}

/// Install SIGINT/SIGTERM handlers that release resources and exit with the
/// conventional 128+signo status.
pub fn install_signal_handlers() {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_signal as libc::sighandler_t;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = 0;
        libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut());
        libc::sigaction(libc::SIGTERM, &action, std::ptr::null_mut());
    }
}

extern "C" fn handle_signal(signo: libc::c_int) {
    run_all();
    unsafe { libc::_exit(128 + signo) }
}
