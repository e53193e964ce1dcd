//! Shared utilities across bootkeep modules.

pub mod files;

pub use files::{place_file, write_file_with_dirs};
