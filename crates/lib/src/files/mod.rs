//! File collaborator used by manifests and the workspace.
//!
//! The core never assumes a file exists: every read is optional, and content
//! that fails to parse is reported as absent. Paths are workspace-relative and
//! `/`-separated (`services/api/package.json`).
//!
//! Two implementations are provided:
//! - [`RealFiles`]: reads and writes below a directory on disk
//! - [`MemoryFiles`]: an in-memory map, used for dry runs and tests

mod memory;
mod real;

pub use memory::MemoryFiles;
pub use real::RealFiles;

use std::io;

use serde_json::Value;

/// Read/write access to the files a workspace synthesizes into.
pub trait FileSynthesizer {
  /// Read a file, or `None` if it does not exist or cannot be read.
  fn try_read_file(&self, path: &str) -> Option<Vec<u8>>;

  /// Read and parse a JSON file, or `None` if it is missing or malformed.
  fn try_read_json(&self, path: &str) -> Option<Value> {
    let bytes = self.try_read_file(path)?;
    serde_json::from_slice(&bytes).ok()
  }

  /// Write a file, creating parent directories as needed.
  fn write_file(&mut self, path: &str, contents: &[u8]) -> io::Result<()>;
}

/// Normalize a workspace-relative path, rejecting ones that escape the root.
pub(crate) fn relative_path(path: &str) -> Option<String> {
  let normalized = crate::util::path::normalize(path);
  let relative = normalized.trim_start_matches('/');
  if relative.is_empty() || relative == "." || relative == ".." || relative.starts_with("../") {
    return None;
  }
  Some(relative.to_string())
}
