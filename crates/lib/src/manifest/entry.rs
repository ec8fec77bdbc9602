//! Manifest entries: constructs that contribute fields to a project's
//! manifest from elsewhere in the tree.
//!
//! An entry finds its target through ownership: the single manifest owned by
//! the entry's project (optionally narrowed to a file name). Fields are merged
//! during [`LifeCycle::BeforeSynth`], so they are in place before late-stage
//! resolvers run.

use anyhow::Context;
use tracing::debug;

use crate::construct::{ConstructError, NodeId, Payload, Tag, Tree};
use crate::lifecycle::LifeCycle;
use crate::project::Project;

use super::merge::{Fields, IntoFields, MergeMode};

/// Fields waiting to be merged into a manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
  fields: Fields,
  mode: MergeMode,
  target: Option<String>,
}

impl ManifestEntry {
  pub fn new(fields: impl IntoFields, mode: MergeMode) -> Self {
    Self {
      fields: fields.into_fields(),
      mode,
      target: None,
    }
  }

  /// Only contribute to the owned manifest named `file_name`.
  pub fn for_file(mut self, file_name: impl Into<String>) -> Self {
    self.target = Some(file_name.into());
    self
  }

  pub fn fields(&self) -> &Fields {
    &self.fields
  }

  pub fn mode(&self) -> MergeMode {
    self.mode
  }

  pub fn target(&self) -> Option<&str> {
    self.target.as_deref()
  }

  /// Attach the entry under `parent` and schedule its merge.
  pub fn attach(self, tree: &mut Tree, parent: NodeId, id: impl Into<String>) -> Result<NodeId, ConstructError> {
    let node = tree.attach_with(parent, id, Payload::Entry(self), [Tag::MANIFEST_ENTRY])?;

    tree.add_hook(node, LifeCycle::BeforeSynth, |ctx| {
      let entry = ctx
        .tree
        .entry(ctx.node)
        .cloned()
        .context("manifest entry payload missing")?;
      let target = entry.target_manifest(ctx.tree, ctx.node)?;

      debug!(
        entry = %ctx.tree.path(ctx.node),
        manifest = %ctx.tree.path(target),
        "merging manifest entry"
      );
      ctx
        .tree
        .expect_manifest_mut(target)?
        .add_fields(entry.fields, entry.mode);
      Ok(())
    });

    Ok(node)
  }

  /// The manifest this entry contributes to.
  fn target_manifest(&self, tree: &Tree, node: NodeId) -> Result<NodeId, ConstructError> {
    let project = Project::of(tree, node)?;
    let Some(file_name) = &self.target else {
      return project.find_deep_child(tree, &Tag::MANIFEST);
    };

    let matches: Vec<_> = project
      .try_find_deep_children(tree, &Tag::MANIFEST)
      .into_iter()
      .filter(|m| tree.manifest(*m).is_some_and(|m| m.file_name() == file_name))
      .collect();

    match matches.as_slice() {
      [only] => Ok(*only),
      _ => Err(ConstructError::NotFound {
        project: tree.path(project.node()),
        tag: Tag::MANIFEST,
      }),
    }
  }
}
