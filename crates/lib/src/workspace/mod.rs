//! The workspace: root of the construct tree and driver of synthesis.
//!
//! Synthesis is a two-phase protocol. Everything before [`Workspace::synth`]
//! is the build phase, where the tree may be changed freely. `synth` then:
//!
//! 1. Runs every lifecycle stage across the tree
//! 2. Finalizes each manifest (key order) and renders it
//! 3. Validates the whole tree, failing with every issue at once
//! 4. Writes rendered manifests whose content changed
//!
//! Nothing is written unless validation passes.

mod types;

pub use types::*;

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::construct::{ConstructError, NodeId, Tag, Tree};
use crate::files::{FileSynthesizer, RealFiles};
use crate::lifecycle;
use crate::manifest::{self, IntoFields, Manifest, ManifestEntry, MergeMode};
use crate::project::{Project, ProjectProps};
use crate::util::hash::hash_bytes;
use crate::validate::{ValidationReport, validate_tree};

/// Root of a construct tree plus the file collaborator it synthesizes into.
pub struct Workspace {
  tree: Tree,
  files: Box<dyn FileSynthesizer>,
  options: SynthOptions,
}

impl Workspace {
  /// Create a workspace named `id` backed by `files`.
  ///
  /// # Errors
  ///
  /// `InvalidId` if `id` is empty or contains `/`.
  pub fn new(id: impl Into<String>, files: impl FileSynthesizer + 'static) -> Result<Self, ConstructError> {
    let mut tree = Tree::new(id)?;
    let root = tree.root();
    tree.add_tag(root, Tag::WORKSPACE);
    tree.add_validation(root, unique_output_paths);

    Ok(Self {
      tree,
      files: Box::new(files),
      options: SynthOptions::default(),
    })
  }

  /// Create a workspace writing to `options.out_dir` on disk.
  ///
  /// # Errors
  ///
  /// - `Construct` if `id` is not a valid construct id
  /// - `OutDir` if the output directory cannot be created
  pub fn open(id: impl Into<String>, options: SynthOptions) -> Result<Self, SynthError> {
    let files = RealFiles::new(&options.out_dir).map_err(|source| SynthError::OutDir {
      path: options.out_dir.clone(),
      source,
    })?;
    Ok(Self::new(id, files)?.with_options(options))
  }

  pub fn with_options(mut self, options: SynthOptions) -> Self {
    self.options = options;
    self
  }

  /// The workspace construct enclosing `node`.
  pub fn of(tree: &Tree, node: NodeId) -> Option<NodeId> {
    tree.find_nearest(node, false, |_, n| n.has_tag(&Tag::WORKSPACE))
  }

  pub fn root(&self) -> NodeId {
    self.tree.root()
  }

  pub fn tree(&self) -> &Tree {
    &self.tree
  }

  pub fn tree_mut(&mut self) -> &mut Tree {
    &mut self.tree
  }

  pub fn files(&self) -> &dyn FileSynthesizer {
    self.files.as_ref()
  }

  pub fn options(&self) -> &SynthOptions {
    &self.options
  }

  /// Attach a plain grouping construct.
  pub fn add_construct(&mut self, parent: NodeId, id: impl Into<String>) -> Result<NodeId, ConstructError> {
    self.tree.attach(parent, id)
  }

  pub fn add_project(
    &mut self,
    parent: NodeId,
    id: impl Into<String>,
    props: ProjectProps,
  ) -> Result<Project, ConstructError> {
    Project::create(&mut self.tree, parent, id, props)
  }

  /// Attach a manifest; its construct id is its file name.
  pub fn add_manifest(&mut self, parent: NodeId, manifest: Manifest) -> Result<NodeId, ConstructError> {
    let id = manifest.file_name().to_string();
    manifest::add_manifest(&mut self.tree, parent, id, manifest)
  }

  pub fn add_manifest_entry(
    &mut self,
    parent: NodeId,
    id: impl Into<String>,
    fields: impl IntoFields,
    mode: MergeMode,
  ) -> Result<NodeId, ConstructError> {
    ManifestEntry::new(fields, mode).attach(&mut self.tree, parent, id)
  }

  /// Run every validation rule without synthesizing.
  pub fn validate(&self) -> ValidationReport {
    validate_tree(&self.tree)
  }

  /// Run the full synthesis protocol.
  ///
  /// # Errors
  ///
  /// - `LifeCycle` if a hook or resolver fails (remaining stages are skipped)
  /// - `Serialize` if a manifest cannot be rendered
  /// - `Validation` with every collected issue
  /// - `Write` if the file collaborator rejects a write
  pub fn synth(&mut self) -> Result<SynthReport, SynthError> {
    let workspace = self.tree.id_of(self.tree.root()).to_string();
    info!(workspace = %workspace, dry_run = self.options.dry_run, "starting synthesis");

    let stages = lifecycle::run_all(&mut self.tree, self.files.as_ref())?;

    let mut rendered = Vec::new();
    for node in self.tree.find_all_tagged(self.tree.root(), &Tag::MANIFEST) {
      let Some(manifest) = self.tree.manifest_mut(node) else {
        continue;
      };
      manifest.finalize();
      let bytes = manifest.render().map_err(|source| SynthError::Serialize {
        path: self.tree.path(node),
        source,
      })?;
      rendered.push((node, bytes));
    }

    let report = validate_tree(&self.tree);
    if !report.is_empty() {
      warn!(workspace = %workspace, issues = report.len(), "validation failed");
      return Err(SynthError::Validation(report));
    }

    let mut files = Vec::with_capacity(rendered.len());
    for (node, bytes) in rendered {
      let path = manifest::output_path(&self.tree, node)?;
      let hash = hash_bytes(&bytes);
      let changed = self.files.try_read_file(&path).as_deref() != Some(bytes.as_slice());

      if !changed {
        debug!(path = %path, "unchanged, skipping write");
      } else if self.options.dry_run {
        info!(path = %path, hash = %hash.short(12), "would write manifest");
      } else {
        self
          .files
          .write_file(&path, &bytes)
          .map_err(|source| SynthError::Write {
            path: path.clone(),
            source,
          })?;
        info!(path = %path, hash = %hash.short(12), "wrote manifest");
      }

      files.push(SynthesizedFile {
        path,
        construct: self.tree.path(node),
        hash,
        changed,
      });
    }

    let report = SynthReport { files, stages };
    info!(
      workspace = %workspace,
      files = report.files.len(),
      changed = report.changed(),
      "synthesis complete"
    );
    Ok(report)
  }
}

/// Root rule: no two manifests may synthesize to the same path.
fn unique_output_paths(tree: &Tree, root: NodeId) -> Vec<String> {
  let mut seen: BTreeMap<String, String> = BTreeMap::new();
  let mut errors = Vec::new();

  for node in tree.find_all_tagged(root, &Tag::MANIFEST) {
    let Ok(path) = manifest::output_path(tree, node) else {
      continue;
    };
    let construct = tree.path(node);
    match seen.get(&path) {
      Some(first) => errors.push(format!(
        "manifests '{first}' and '{construct}' both synthesize '{path}'"
      )),
      None => {
        seen.insert(path, construct);
      }
    }
  }

  errors
}
