//! Identity, capability and error types for the construct tree.

use std::borrow::Cow;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::lifecycle::{Hook, LifeCycle};
use crate::manifest::{Manifest, ManifestEntry};
use crate::project::ProjectSettings;
use crate::validate::ValidationRule;

/// Handle to a node in a [`Tree`](super::Tree).
///
/// Handles are only meaningful for the tree that issued them. They stay valid
/// after the node is detached; use [`Tree::is_attached`](super::Tree::is_attached)
/// to tell whether the node is still part of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl std::fmt::Display for NodeId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// A capability label a construct declares.
///
/// Tree queries filter by tag instead of by concrete type, so a domain layer
/// can introduce its own kinds (`Tag::new("node-project")`) next to the
/// built-in ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(Cow<'static, str>);

impl Tag {
  pub const WORKSPACE: Tag = Tag(Cow::Borrowed("workspace"));
  pub const PROJECT: Tag = Tag(Cow::Borrowed("project"));
  pub const MANIFEST: Tag = Tag(Cow::Borrowed("manifest"));
  pub const MANIFEST_ENTRY: Tag = Tag(Cow::Borrowed("manifest-entry"));

  pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
    Tag(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Tag {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

/// Typed data carried by a construct.
///
/// Tags say what a construct *is*; the payload holds the state the built-in
/// kinds need. Domain constructs that only group other constructs carry
/// [`Payload::None`].
#[derive(Debug, Default)]
pub enum Payload {
  #[default]
  None,
  Project(ProjectSettings),
  Manifest(Manifest),
  Entry(ManifestEntry),
}

/// A single construct in the tree.
pub struct Node {
  pub(crate) id: String,
  pub(crate) parent: Option<NodeId>,
  pub(crate) children: Vec<NodeId>,
  pub(crate) tags: BTreeSet<Tag>,
  pub(crate) payload: Payload,
  pub(crate) validations: Vec<ValidationRule>,
  pub(crate) hooks: Vec<(LifeCycle, Hook)>,
}

impl Node {
  pub(crate) fn new(id: String, parent: Option<NodeId>) -> Self {
    Self {
      id,
      parent,
      children: Vec::new(),
      tags: BTreeSet::new(),
      payload: Payload::None,
      validations: Vec::new(),
      hooks: Vec::new(),
    }
  }

  /// Identifier, unique among siblings.
  pub fn id(&self) -> &str {
    &self.id
  }

  /// Parent handle, absent for the root and for detached subtrees.
  pub fn parent(&self) -> Option<NodeId> {
    self.parent
  }

  /// Children in insertion order.
  pub fn children(&self) -> &[NodeId] {
    &self.children
  }

  pub fn tags(&self) -> &BTreeSet<Tag> {
    &self.tags
  }

  pub fn has_tag(&self, tag: &Tag) -> bool {
    self.tags.contains(tag)
  }

  pub fn payload(&self) -> &Payload {
    &self.payload
  }

  /// Number of hooks registered for `stage`.
  pub fn hook_count(&self, stage: LifeCycle) -> usize {
    self.hooks.iter().filter(|(s, _)| *s == stage).count()
  }

  pub fn validation_count(&self) -> usize {
    self.validations.len()
  }
}

impl std::fmt::Debug for Node {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Node")
      .field("id", &self.id)
      .field("parent", &self.parent)
      .field("children", &self.children)
      .field("tags", &self.tags)
      .field("payload", &self.payload)
      .field("validations", &self.validations.len())
      .field("hooks", &self.hooks.len())
      .finish()
  }
}

/// Structural errors raised immediately by tree operations and queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructError {
  /// Two siblings would share an id.
  #[error("construct '{parent}' already has a child named '{id}'")]
  DuplicateId { parent: String, id: String },

  /// The id cannot be used as a path segment.
  #[error("invalid construct id '{id}': {reason}")]
  InvalidId { id: String, reason: &'static str },

  /// The scope was removed from the tree.
  #[error("construct '{path}' has been removed from the tree")]
  Detached { path: String },

  /// No enclosing project exists where one is required.
  #[error("construct '{path}' must be a child of a project or workspace")]
  NotOwned { path: String },

  /// A "find exactly one" query matched zero or several constructs.
  #[error("project '{project}' does not own exactly one '{tag}' construct")]
  NotFound { project: String, tag: Tag },

  #[error("construct '{path}' is not a project")]
  NotAProject { path: String },

  #[error("construct '{path}' is not a manifest")]
  NotAManifest { path: String },
}
