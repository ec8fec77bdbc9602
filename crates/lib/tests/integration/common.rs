//! Shared helpers for integration tests.

use pdkit_lib::files::MemoryFiles;
use pdkit_lib::manifest::Manifest;
use pdkit_lib::project::{Project, ProjectProps};
use pdkit_lib::workspace::Workspace;

/// A workspace with a single root project `app` and its `package.json`.
pub struct TestWorkspace {
  pub ws: Workspace,
  pub app: Project,
  pub manifest: pdkit_lib::construct::NodeId,
}

impl TestWorkspace {
  pub fn new() -> Self {
    Self::with_files(MemoryFiles::new())
  }

  pub fn with_files(files: MemoryFiles) -> Self {
    let mut ws = Workspace::new("workspace", files).unwrap();
    let root = ws.root();
    let app = ws.add_project(root, "app", ProjectProps::default()).unwrap();
    let manifest = ws
      .add_manifest(
        app.node(),
        Manifest::new("package.json").with_key_order(["name", "version", "dependencies"]),
      )
      .unwrap();
    Self { ws, app, manifest }
  }

  /// Synthesized content at `path`, if any.
  pub fn read(&self, path: &str) -> Option<String> {
    self
      .ws
      .files()
      .try_read_file(path)
      .map(|b| String::from_utf8(b).unwrap())
  }
}
