//! Shared test utilities for bootkeep tests.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment simulating a boot partition layout.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Simulated boot mount containing kernel images
    pub boot: PathBuf,
    /// Reconciliation target directory
    pub target: PathBuf,
    /// Scratch area for staged build outputs
    pub scratch: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with temporary directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let boot = base.join("boot");
        let target = boot.join("managed");
        let scratch = base.join("scratch");
        fs::create_dir_all(&boot).expect("Failed to create boot dir");
        fs::create_dir_all(&target).expect("Failed to create target dir");
        fs::create_dir_all(&scratch).expect("Failed to create scratch dir");

        Self {
            _temp_dir: temp_dir,
            boot,
            target,
            scratch,
        }
    }
}

/// Write a file with the given content and return its path.
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write file");
    path
}

/// SHA-256 digest of a file, for content-identity assertions.
pub fn file_digest(path: &Path) -> String {
    let bytes = fs::read(path).expect("Failed to read file for digest");
    format!("{:x}", Sha256::digest(bytes))
}

/// Names of all plain files in a directory, sorted.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
