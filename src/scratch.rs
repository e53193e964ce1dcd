//! The run-scoped scratch working area.
//!
//! Build outputs land here first and only move to target directories through
//! the retention layer. The directory is created fresh at the start of a run
//! and recursively removed on every exit path: `Drop` covers normal and
//! error returns, the registration with [`crate::cleanup`] covers signals.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cleanup;

/// A scratch directory tied to the lifetime of one run.
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create the scratch area under the system temp directory.
    ///
    /// A leftover directory from a previous run with the same pid is removed
    /// and recreated fresh.
    pub fn create() -> Result<ScratchDir> {
        let path = env::temp_dir().join(format!("bootkeep.{}", std::process::id()));
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)
            .with_context(|| format!("cannot create scratch directory {}", path.display()))?;
        cleanup::register_scratch(&path);
        Ok(ScratchDir { path })
    }

    /// Path to the scratch directory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        cleanup::remove_scratch();
        // The registration only sticks for the first scratch dir of the
        // process; remove ours directly in case it was not the first.
        let _ = fs::remove_dir_all(&self.path);
    }
}
