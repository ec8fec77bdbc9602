//! Manifests and the field-merge engine.
//!
//! A manifest is a construct that accumulates key/value fields from many
//! contributors and serializes them into one artifact inside its project:
//!
//! - [`merge`]: pure shallow/deep merge and key-ordering functions
//! - [`Manifest`]: the payload stored in the tree
//! - [`ManifestEntry`]: a construct contributing fields from elsewhere
//! - field resolvers: late-stage callbacks finalizing computed fields

mod entry;
pub mod merge;
mod resolve;
mod types;

pub use entry::ManifestEntry;
pub use merge::{Fields, IntoFields, MergeMode};
pub use resolve::{RESOLVER_STAGE, resolve_unresolved, run_field_resolvers, unresolved_entries};
pub use types::*;

use crate::construct::{ConstructError, NodeId, Payload, Tag, Tree};
use crate::project::Project;
use crate::util::path;

/// Attach `manifest` under `parent` as a construct named `id`.
///
/// The manifest must end up owned by a project; that is checked when the
/// tree is validated.
pub fn add_manifest(
  tree: &mut Tree,
  parent: NodeId,
  id: impl Into<String>,
  manifest: Manifest,
) -> Result<NodeId, ConstructError> {
  let node = tree.attach_with(parent, id, Payload::Manifest(manifest), [Tag::MANIFEST])?;

  tree.add_validation(node, |tree, node| match output_path(tree, node) {
    Ok(_) => Vec::new(),
    Err(e) => vec![e.to_string()],
  });

  Ok(node)
}

/// Workspace-relative path the manifest at `node` is written to.
///
/// # Errors
///
/// - `NotAManifest` if `node` is not a manifest
/// - `NotOwned` if no project owns it
pub fn output_path(tree: &Tree, node: NodeId) -> Result<String, ConstructError> {
  let manifest = tree
    .manifest(node)
    .ok_or_else(|| ConstructError::NotAManifest { path: tree.path(node) })?;
  let project = Project::of(tree, node)?;
  Ok(path::join([project.project_relative_path(tree).as_str(), manifest.file_name()]))
}
