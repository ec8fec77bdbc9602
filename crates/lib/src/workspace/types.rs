//! Options, report and error types for workspace synthesis.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DRY_RUN_ENV, OUT_DIR_ENV};
use crate::construct::ConstructError;
use crate::lifecycle::{LifeCycleError, StageSummary};
use crate::manifest::ManifestError;
use crate::util::hash::ContentHash;
use crate::validate::ValidationReport;

/// Configuration for a synthesis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthOptions {
  /// Directory the workspace synthesizes into (for [`RealFiles`]).
  ///
  /// [`RealFiles`]: crate::files::RealFiles
  pub out_dir: PathBuf,
  /// Render and report without writing anything.
  pub dry_run: bool,
}

impl Default for SynthOptions {
  fn default() -> Self {
    Self {
      out_dir: PathBuf::from("."),
      dry_run: false,
    }
  }
}

impl SynthOptions {
  /// Defaults overridden by `PDKIT_OUT_DIR` and `PDKIT_DRY_RUN`.
  pub fn from_env() -> Self {
    let mut options = Self::default();

    if let Ok(dir) = std::env::var(OUT_DIR_ENV)
      && !dir.is_empty()
    {
      options.out_dir = PathBuf::from(dir);
    }
    if let Ok(value) = std::env::var(DRY_RUN_ENV) {
      options.dry_run = matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }

    options
  }
}

/// One synthesized artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizedFile {
  /// Workspace-relative output path.
  pub path: String,
  /// Tree path of the manifest construct.
  pub construct: String,
  pub hash: ContentHash,
  /// Whether the content differs from what was on disk before the run.
  pub changed: bool,
}

/// Outcome of a successful synthesis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthReport {
  pub files: Vec<SynthesizedFile>,
  pub stages: Vec<StageSummary>,
}

impl SynthReport {
  pub fn file(&self, path: &str) -> Option<&SynthesizedFile> {
    self.files.iter().find(|f| f.path == path)
  }

  /// Number of artifacts whose content changed.
  pub fn changed(&self) -> usize {
    self.files.iter().filter(|f| f.changed).count()
  }
}

/// Errors that fail a synthesis run.
#[derive(Debug, Error)]
pub enum SynthError {
  #[error(transparent)]
  Construct(#[from] ConstructError),

  #[error(transparent)]
  LifeCycle(#[from] LifeCycleError),

  /// Every validation issue in the tree.
  #[error("{0}")]
  Validation(ValidationReport),

  #[error("failed to serialize manifest '{path}': {source}")]
  Serialize {
    path: String,
    #[source]
    source: ManifestError,
  },

  #[error("failed to prepare output directory '{}': {source}", .path.display())]
  OutDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write '{path}': {source}")]
  Write {
    path: String,
    #[source]
    source: io::Error,
  },
}
