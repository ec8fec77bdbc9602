use std::collections::BTreeMap;
use std::io;

use tracing::debug;

use super::{FileSynthesizer, relative_path};

/// In-memory file collaborator.
///
/// Keys are normalized workspace-relative paths, so `./a.json` and `a.json`
/// address the same file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryFiles {
  files: BTreeMap<String, Vec<u8>>,
}

impl MemoryFiles {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style seeding of an existing file.
  pub fn with_file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
    if let Some(key) = relative_path(path) {
      self.files.insert(key, contents.into());
    }
    self
  }

  pub fn get(&self, path: &str) -> Option<&[u8]> {
    let key = relative_path(path)?;
    self.files.get(&key).map(Vec::as_slice)
  }

  /// File content as UTF-8, lossily converted.
  pub fn get_string(&self, path: &str) -> Option<String> {
    self.get(path).map(|b| String::from_utf8_lossy(b).into_owned())
  }

  /// All stored paths in sorted order.
  pub fn paths(&self) -> impl Iterator<Item = &str> {
    self.files.keys().map(String::as_str)
  }
}

impl FileSynthesizer for MemoryFiles {
  fn try_read_file(&self, path: &str) -> Option<Vec<u8>> {
    self.get(path).map(<[u8]>::to_vec)
  }

  fn write_file(&mut self, path: &str, contents: &[u8]) -> io::Result<()> {
    let key = relative_path(path).ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("path escapes the workspace: {path}"),
      )
    })?;
    debug!(path = %key, bytes = contents.len(), "writing in-memory file");
    self.files.insert(key, contents.to_vec());
    Ok(())
  }
}
