//! Arena-backed construct tree.
//!
//! All nodes live in a single arena owned by [`Tree`]; parent/child links are
//! [`NodeId`] handles into it. Traversal is always pre-order with siblings in
//! insertion order, which is the one ordering every query, stage pass and
//! merge in the crate relies on.

use tracing::debug;

use crate::lifecycle::{HookContext, LifeCycle};
use crate::manifest::{Manifest, ManifestEntry};
use crate::project::ProjectSettings;

use super::types::{ConstructError, Node, NodeId, Payload, Tag};

/// The construct tree.
#[derive(Debug)]
pub struct Tree {
  nodes: Vec<Node>,
}

impl Tree {
  /// Create a tree containing only a root node named `root_id`.
  ///
  /// # Errors
  ///
  /// `InvalidId` if `root_id` is empty or contains `/`.
  pub fn new(root_id: impl Into<String>) -> Result<Self, ConstructError> {
    let root_id = check_id(root_id.into())?;
    Ok(Self {
      nodes: vec![Node::new(root_id, None)],
    })
  }

  pub fn root(&self) -> NodeId {
    NodeId(0)
  }

  /// Number of nodes ever created, detached ones included.
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Borrow a node.
  ///
  /// # Panics
  ///
  /// Panics if `id` was issued by a different tree.
  pub fn node(&self, id: NodeId) -> &Node {
    &self.nodes[id.0]
  }

  fn node_mut(&mut self, id: NodeId) -> &mut Node {
    &mut self.nodes[id.0]
  }

  /// Register a new child named `id` under `parent`.
  ///
  /// # Errors
  ///
  /// - `InvalidId` if `id` is empty or contains `/`
  /// - `DuplicateId` if `parent` already has a child named `id`
  /// - `Detached` if `parent` is no longer part of the tree
  pub fn attach(&mut self, parent: NodeId, id: impl Into<String>) -> Result<NodeId, ConstructError> {
    let id = check_id(id.into())?;

    if !self.is_attached(parent) {
      return Err(ConstructError::Detached {
        path: self.path(parent),
      });
    }
    if self.child(parent, &id).is_some() {
      return Err(ConstructError::DuplicateId {
        parent: self.path(parent),
        id,
      });
    }

    let child = NodeId(self.nodes.len());
    self.nodes.push(Node::new(id, Some(parent)));
    self.node_mut(parent).children.push(child);

    debug!(path = %self.path(child), "attached construct");
    Ok(child)
  }

  /// Attach a child and give it a payload and tags in one step.
  pub fn attach_with(
    &mut self,
    parent: NodeId,
    id: impl Into<String>,
    payload: Payload,
    tags: impl IntoIterator<Item = Tag>,
  ) -> Result<NodeId, ConstructError> {
    let child = self.attach(parent, id)?;
    let node = self.node_mut(child);
    node.payload = payload;
    node.tags.extend(tags);
    Ok(child)
  }

  /// Find a direct child of `parent` by id.
  pub fn child(&self, parent: NodeId, id: &str) -> Option<NodeId> {
    self
      .node(parent)
      .children
      .iter()
      .copied()
      .find(|c| self.node(*c).id == id)
  }

  pub fn children(&self, parent: NodeId) -> &[NodeId] {
    &self.node(parent).children
  }

  pub fn parent(&self, id: NodeId) -> Option<NodeId> {
    self.node(id).parent
  }

  pub fn id_of(&self, id: NodeId) -> &str {
    &self.node(id).id
  }

  /// Ancestor chain from the root (or the top of a detached subtree) down to
  /// `id`, inclusive.
  pub fn scopes(&self, id: NodeId) -> Vec<NodeId> {
    let mut chain = vec![id];
    let mut current = id;
    while let Some(parent) = self.node(current).parent {
      chain.push(parent);
      current = parent;
    }
    chain.reverse();
    chain
  }

  /// Slash-joined ids from the root to `id`.
  pub fn path(&self, id: NodeId) -> String {
    self
      .scopes(id)
      .into_iter()
      .map(|s| self.node(s).id.as_str())
      .collect::<Vec<_>>()
      .join("/")
  }

  /// Resolve a path produced by [`Tree::path`].
  pub fn find_by_path(&self, path: &str) -> Option<NodeId> {
    let mut segments = path.split('/');
    let root = self.root();
    if segments.next()? != self.node(root).id {
      return None;
    }
    segments.try_fold(root, |current, segment| self.child(current, segment))
  }

  /// Whether `id` is still reachable from the root.
  pub fn is_attached(&self, id: NodeId) -> bool {
    self.scopes(id).first() == Some(&self.root())
  }

  /// `id` and all of its descendants in pre-order, siblings in insertion
  /// order.
  ///
  /// Returns a fresh snapshot on every call; mutating the tree afterwards does
  /// not affect an already returned sequence.
  pub fn find_all(&self, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
      out.push(current);
      stack.extend(self.node(current).children.iter().rev().copied());
    }
    out
  }

  /// [`Tree::find_all`] filtered to constructs carrying `tag`.
  pub fn find_all_tagged(&self, id: NodeId, tag: &Tag) -> Vec<NodeId> {
    self
      .find_all(id)
      .into_iter()
      .filter(|n| self.node(*n).has_tag(tag))
      .collect()
  }

  /// Walk from `id` towards the root and return the first scope matching
  /// `predicate`.
  ///
  /// With `skip_self` the walk starts at the parent. This is the only upward
  /// search in the crate; ownership and "nearest enclosing" lookups are all
  /// expressed through it.
  pub fn find_nearest<P>(&self, id: NodeId, skip_self: bool, predicate: P) -> Option<NodeId>
  where
    P: Fn(NodeId, &Node) -> bool,
  {
    let mut current = if skip_self { self.node(id).parent } else { Some(id) };
    while let Some(scope) = current {
      let node = self.node(scope);
      if predicate(scope, node) {
        return Some(scope);
      }
      current = node.parent;
    }
    None
  }

  /// Detach the child named `id` from `parent` together with its subtree.
  ///
  /// Returns the detached handle, or `None` if `parent` has no such child.
  pub fn try_remove_child(&mut self, parent: NodeId, id: &str) -> Option<NodeId> {
    let child = self.child(parent, id)?;
    let path = self.path(child);
    self.node_mut(parent).children.retain(|c| *c != child);
    self.node_mut(child).parent = None;
    debug!(path = %path, "removed construct");
    Some(child)
  }

  pub fn add_tag(&mut self, id: NodeId, tag: Tag) {
    self.node_mut(id).tags.insert(tag);
  }

  pub fn has_tag(&self, id: NodeId, tag: &Tag) -> bool {
    self.node(id).has_tag(tag)
  }

  /// Register a validation rule on `id`.
  ///
  /// Rules run once per validation pass and return zero or more error
  /// messages for this construct.
  pub fn add_validation<F>(&mut self, id: NodeId, rule: F)
  where
    F: Fn(&Tree, NodeId) -> Vec<String> + 'static,
  {
    self.node_mut(id).validations.push(Box::new(rule));
  }

  /// Register a hook on `id` that runs when `stage` executes.
  pub fn add_hook<F>(&mut self, id: NodeId, stage: LifeCycle, hook: F)
  where
    F: FnMut(&mut HookContext<'_>) -> anyhow::Result<()> + 'static,
  {
    self.node_mut(id).hooks.push((stage, Box::new(hook)));
  }

  pub fn payload(&self, id: NodeId) -> &Payload {
    &self.node(id).payload
  }

  pub fn manifest(&self, id: NodeId) -> Option<&Manifest> {
    match &self.node(id).payload {
      Payload::Manifest(m) => Some(m),
      _ => None,
    }
  }

  pub fn manifest_mut(&mut self, id: NodeId) -> Option<&mut Manifest> {
    match &mut self.node_mut(id).payload {
      Payload::Manifest(m) => Some(m),
      _ => None,
    }
  }

  /// Like [`Tree::manifest_mut`] but fails with `NotAManifest`.
  pub fn expect_manifest_mut(&mut self, id: NodeId) -> Result<&mut Manifest, ConstructError> {
    let path = self.path(id);
    self.manifest_mut(id).ok_or(ConstructError::NotAManifest { path })
  }

  pub fn project_settings(&self, id: NodeId) -> Option<&ProjectSettings> {
    match &self.node(id).payload {
      Payload::Project(p) => Some(p),
      _ => None,
    }
  }

  pub fn entry(&self, id: NodeId) -> Option<&ManifestEntry> {
    match &self.node(id).payload {
      Payload::Entry(e) => Some(e),
      _ => None,
    }
  }

  pub(crate) fn take_hooks(&mut self, id: NodeId) -> Vec<(LifeCycle, crate::lifecycle::Hook)> {
    std::mem::take(&mut self.node_mut(id).hooks)
  }

  /// Put hooks taken with [`Tree::take_hooks`] back, keeping any registered in
  /// the meantime after them.
  pub(crate) fn restore_hooks(&mut self, id: NodeId, mut hooks: Vec<(LifeCycle, crate::lifecycle::Hook)>) {
    let node = self.node_mut(id);
    hooks.append(&mut node.hooks);
    node.hooks = hooks;
  }
}

/// Ids are path segments: non-empty and free of `/`.
fn check_id(id: String) -> Result<String, ConstructError> {
  if id.is_empty() {
    return Err(ConstructError::InvalidId {
      id,
      reason: "must not be empty",
    });
  }
  if id.contains('/') {
    return Err(ConstructError::InvalidId {
      id,
      reason: "must not contain '/'",
    });
  }
  Ok(id)
}
