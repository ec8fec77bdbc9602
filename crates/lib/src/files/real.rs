use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::consts::APP_NAME;

use super::{FileSynthesizer, relative_path};

/// File collaborator rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct RealFiles {
  root: PathBuf,
}

impl RealFiles {
  /// Root the collaborator at `root`, creating the directory if needed.
  pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
    let root = root.as_ref();
    fs::create_dir_all(root)?;
    let root = dunce::canonicalize(root)?;
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn resolve(&self, path: &str) -> Option<PathBuf> {
    relative_path(path).map(|rel| self.root.join(rel))
  }
}

impl FileSynthesizer for RealFiles {
  fn try_read_file(&self, path: &str) -> Option<Vec<u8>> {
    let full = self.resolve(path)?;
    match fs::read(&full) {
      Ok(bytes) => Some(bytes),
      Err(e) => {
        trace!(path = %full.display(), error = %e, "file not readable");
        None
      }
    }
  }

  /// Writes atomically: content goes to a temp file in the target directory
  /// which is then renamed over the destination.
  fn write_file(&mut self, path: &str, contents: &[u8]) -> io::Result<()> {
    let full = self.resolve(path).ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("path escapes the workspace: {path}"),
      )
    })?;
    let dir = full.parent().unwrap_or(&self.root);
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::Builder::new().prefix(&format!(".{APP_NAME}-")).tempfile_in(dir)?;
    temp.write_all(contents)?;
    persist(temp, &full)?;

    debug!(path = %full.display(), bytes = contents.len(), "wrote file");
    Ok(())
  }
}

fn persist(temp: NamedTempFile, target: &Path) -> io::Result<()> {
  temp.persist(target).map(|_| ()).map_err(|e| e.error)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn write_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let mut files = RealFiles::new(temp.path()).unwrap();

    files.write_file("services/api/package.json", b"{\"name\":\"api\"}").unwrap();

    let written = std::fs::read(temp.path().join("services/api/package.json")).unwrap();
    assert_eq!(written, b"{\"name\":\"api\"}");
  }

  #[test]
  fn write_replaces_existing_content() {
    let temp = TempDir::new().unwrap();
    let mut files = RealFiles::new(temp.path()).unwrap();

    files.write_file("a.json", b"1").unwrap();
    files.write_file("a.json", b"2").unwrap();

    assert_eq!(files.try_read_file("a.json"), Some(b"2".to_vec()));
  }

  #[test]
  fn no_temp_files_left_behind() {
    let temp = TempDir::new().unwrap();
    let mut files = RealFiles::new(temp.path()).unwrap();
    files.write_file("a.json", b"{}").unwrap();

    let names: Vec<_> = std::fs::read_dir(temp.path())
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
      .collect();
    assert_eq!(names, ["a.json"]);
  }

  #[test]
  fn missing_file_reads_as_absent() {
    let temp = TempDir::new().unwrap();
    let files = RealFiles::new(temp.path()).unwrap();
    assert_eq!(files.try_read_file("missing.json"), None);
    assert_eq!(files.try_read_json("missing.json"), None);
  }

  #[test]
  fn reads_existing_json() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("package.json"), r#"{"version":"1.2.3"}"#).unwrap();
    let files = RealFiles::new(temp.path()).unwrap();

    let json = files.try_read_json("package.json").unwrap();
    assert_eq!(json["version"], "1.2.3");
  }

  #[test]
  fn escaping_paths_are_rejected() {
    let temp = TempDir::new().unwrap();
    let mut files = RealFiles::new(temp.path().join("ws")).unwrap();
    assert_eq!(files.try_read_file("../x"), None);
    assert!(files.write_file("../x", b"").is_err());
  }
}
