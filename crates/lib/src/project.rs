//! Projects: path-scoping and ownership boundaries.
//!
//! A project owns every construct below it up to (but not into) the next
//! nested project. Ownership drives where manifests are written and which
//! constructs deep-child queries see.
//!
//! # Ownership contract
//!
//! [`Project::of`] returns the nearest project strictly above a construct. A
//! top-level project has nothing above it and owns itself; any other construct
//! without an enclosing project is an error (`NotOwned`). Code that needs to
//! tell "top-level" apart uses [`Project::parent`], which never returns the
//! project itself.
//!
//! # Paths
//!
//! ```text
//! workspace
//! └── api          project_path = "services/api"  -> /services/api
//!     └── v2       project_path = "v2"            -> /services/api/v2
//! ```

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_PROJECT_SUBPATH, WORKSPACE_ROOT_PATH};
use crate::construct::{ConstructError, NodeId, Payload, Tag, Tree};
use crate::util::path;

/// Options for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProps {
  /// Path relative to the enclosing project. Required for nested projects.
  pub project_path: Option<String>,
  /// Source directory relative to the project, `.` by default.
  pub source_path: Option<String>,
  /// Output directory relative to the project, `.` by default.
  pub dist_path: Option<String>,
}

impl ProjectProps {
  pub fn with_project_path(mut self, path: impl Into<String>) -> Self {
    self.project_path = Some(path.into());
    self
  }

  pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
    self.source_path = Some(path.into());
    self
  }

  pub fn with_dist_path(mut self, path: impl Into<String>) -> Self {
    self.dist_path = Some(path.into());
    self
  }
}

/// Project state stored in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
  project_path: Option<String>,
  source_path: String,
  dist_path: String,
}

impl From<ProjectProps> for ProjectSettings {
  fn from(props: ProjectProps) -> Self {
    Self {
      project_path: props.project_path,
      source_path: props.source_path.unwrap_or_else(|| DEFAULT_PROJECT_SUBPATH.to_string()),
      dist_path: props.dist_path.unwrap_or_else(|| DEFAULT_PROJECT_SUBPATH.to_string()),
    }
  }
}

impl ProjectSettings {
  /// The explicit relative path override, if any.
  pub fn project_path_override(&self) -> Option<&str> {
    self.project_path.as_deref()
  }
}

/// Handle to a project construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Project(NodeId);

impl Project {
  /// Attach a new project under `parent`.
  ///
  /// Registers the nested-project rule: a project with an enclosing project
  /// must declare its own `project_path`. The rule is checked when the tree
  /// is validated, not here.
  pub fn create(
    tree: &mut Tree,
    parent: NodeId,
    id: impl Into<String>,
    props: ProjectProps,
  ) -> Result<Project, ConstructError> {
    let node = tree.attach_with(parent, id, Payload::Project(props.into()), [Tag::PROJECT])?;

    tree.add_validation(node, |tree, node| {
      let mut errors = Vec::new();
      let nested = Project::parent_of(tree, node).is_some();
      let explicit = tree
        .project_settings(node)
        .is_some_and(|s| s.project_path.is_some());

      if nested && !explicit {
        errors.push("nested projects must explicitly define a project_path".to_string());
      }
      errors
    });

    Ok(Project(node))
  }

  /// Wrap an existing project construct.
  pub fn from_node(tree: &Tree, node: NodeId) -> Result<Project, ConstructError> {
    if Self::is(tree, node) {
      Ok(Project(node))
    } else {
      Err(ConstructError::NotAProject { path: tree.path(node) })
    }
  }

  /// Whether `node` is a project.
  pub fn is(tree: &Tree, node: NodeId) -> bool {
    tree.has_tag(node, &Tag::PROJECT) && tree.project_settings(node).is_some()
  }

  /// The project that owns `node`.
  ///
  /// # Errors
  ///
  /// `NotOwned` if `node` is not a project and has no project above it.
  pub fn of(tree: &Tree, node: NodeId) -> Result<Project, ConstructError> {
    match Self::parent_of(tree, node) {
      Some(project) => Ok(project),
      None if Self::is(tree, node) => Ok(Project(node)),
      None => Err(ConstructError::NotOwned { path: tree.path(node) }),
    }
  }

  /// Like [`Project::of`], returning `None` instead of failing.
  pub fn try_of(tree: &Tree, node: NodeId) -> Option<Project> {
    Self::of(tree, node).ok()
  }

  /// Nearest project strictly above `node`.
  fn parent_of(tree: &Tree, node: NodeId) -> Option<Project> {
    tree
      .find_nearest(node, true, |scope, _| Self::is(tree, scope))
      .map(Project)
  }

  pub fn node(self) -> NodeId {
    self.0
  }

  /// The enclosing project, absent for a top-level project.
  pub fn parent(self, tree: &Tree) -> Option<Project> {
    Self::parent_of(tree, self.0)
  }

  /// Descendants tagged `tag` that this project owns.
  ///
  /// Constructs inside nested projects belong to those projects and are not
  /// returned. A nested project itself is owned by this one and is returned
  /// when it carries `tag`.
  pub fn try_find_deep_children(self, tree: &Tree, tag: &Tag) -> Vec<NodeId> {
    tree
      .find_all_tagged(self.0, tag)
      .into_iter()
      .filter(|n| *n != self.0)
      .filter(|n| Self::try_of(tree, *n) == Some(self))
      .collect()
  }

  /// The only owned descendant tagged `tag`, or `None` when there are zero or
  /// several.
  pub fn try_find_deep_child(self, tree: &Tree, tag: &Tag) -> Option<NodeId> {
    match self.try_find_deep_children(tree, tag).as_slice() {
      [only] => Some(*only),
      _ => None,
    }
  }

  /// Like [`Project::try_find_deep_child`], failing with `NotFound`.
  pub fn find_deep_child(self, tree: &Tree, tag: &Tag) -> Result<NodeId, ConstructError> {
    self
      .try_find_deep_child(tree, tag)
      .ok_or_else(|| ConstructError::NotFound {
        project: tree.path(self.0),
        tag: tag.clone(),
      })
  }

  /// Projects nested directly in this one.
  pub fn projects(self, tree: &Tree) -> Vec<Project> {
    self
      .try_find_deep_children(tree, &Tag::PROJECT)
      .into_iter()
      .filter(|n| Self::is(tree, *n))
      .map(Project)
      .collect()
  }

  fn settings(self, tree: &Tree) -> Option<&ProjectSettings> {
    tree.project_settings(self.0)
  }

  /// Absolute path within the workspace, e.g. `/services/api/v2`.
  pub fn project_path(self, tree: &Tree) -> String {
    let parent_path = self
      .parent(tree)
      .map(|p| p.project_path(tree))
      .unwrap_or_else(|| WORKSPACE_ROOT_PATH.to_string());
    let own = self
      .settings(tree)
      .and_then(|s| s.project_path.as_deref())
      .unwrap_or("");

    path::join([parent_path.as_str(), own])
  }

  /// [`Project::project_path`] without the leading `/`; empty for the
  /// workspace root.
  pub fn project_relative_path(self, tree: &Tree) -> String {
    strip_root(self.project_path(tree))
  }

  pub fn source_path(self, tree: &Tree) -> &str {
    self
      .settings(tree)
      .map(|s| s.source_path.as_str())
      .unwrap_or(DEFAULT_PROJECT_SUBPATH)
  }

  pub fn dist_path(self, tree: &Tree) -> &str {
    self
      .settings(tree)
      .map(|s| s.dist_path.as_str())
      .unwrap_or(DEFAULT_PROJECT_SUBPATH)
  }

  /// Source root relative to the workspace, e.g. `services/api/src`.
  pub fn project_relative_source_path(self, tree: &Tree) -> String {
    strip_root(path::join([self.project_path(tree).as_str(), self.source_path(tree)]))
  }
}

fn strip_root(path: String) -> String {
  match path.strip_prefix('/') {
    Some(rest) => rest.to_string(),
    None => path,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::validate::validate_tree;

  fn nested() -> (Tree, Project, Project, NodeId) {
    let mut tree = Tree::new("workspace").unwrap();
    let root = tree.root();
    let outer = Project::create(
      &mut tree,
      root,
      "outer",
      ProjectProps::default().with_project_path("services/api"),
    )
    .unwrap();
    let inner = Project::create(
      &mut tree,
      outer.node(),
      "inner",
      ProjectProps::default().with_project_path("v2"),
    )
    .unwrap();
    let leaf = tree.attach(inner.node(), "leaf").unwrap();
    (tree, outer, inner, leaf)
  }

  #[test]
  fn ownership_resolves_to_nearest_project() {
    let (tree, outer, inner, leaf) = nested();
    assert_eq!(Project::of(&tree, leaf).unwrap(), inner);
    assert_eq!(Project::of(&tree, inner.node()).unwrap(), outer);
  }

  #[test]
  fn top_level_project_owns_itself() {
    let (tree, outer, ..) = nested();
    assert_eq!(Project::of(&tree, outer.node()).unwrap(), outer);
    assert_eq!(outer.parent(&tree), None);
  }

  #[test]
  fn unowned_construct_fails() {
    let mut tree = Tree::new("workspace").unwrap();
    let root = tree.root();
    let stray = tree.attach(root, "stray").unwrap();

    assert_eq!(
      Project::of(&tree, stray),
      Err(ConstructError::NotOwned {
        path: "workspace/stray".to_string()
      })
    );
    assert_eq!(Project::try_of(&tree, stray), None);
  }

  #[test]
  fn from_node_checks_kind() {
    let (tree, outer, _, leaf) = nested();
    assert_eq!(Project::from_node(&tree, outer.node()).unwrap(), outer);
    assert!(matches!(
      Project::from_node(&tree, leaf),
      Err(ConstructError::NotAProject { .. })
    ));
  }

  #[test]
  fn nested_path_composition() {
    let (tree, outer, inner, _) = nested();
    assert_eq!(outer.project_path(&tree), "/services/api");
    assert_eq!(inner.project_path(&tree), "/services/api/v2");
    assert_eq!(inner.project_relative_path(&tree), "services/api/v2");
  }

  #[test]
  fn top_level_project_without_override_sits_at_root() {
    let mut tree = Tree::new("workspace").unwrap();
    let root = tree.root();
    let project = Project::create(&mut tree, root, "app", ProjectProps::default()).unwrap();

    assert_eq!(project.project_path(&tree), "/");
    assert_eq!(project.project_relative_path(&tree), "");
    assert_eq!(project.project_relative_source_path(&tree), "");
    assert_eq!(project.source_path(&tree), ".");
    assert_eq!(project.dist_path(&tree), ".");
  }

  #[test]
  fn relative_source_path_has_no_leading_separator() {
    let mut tree = Tree::new("workspace").unwrap();
    let root = tree.root();
    let project = Project::create(
      &mut tree,
      root,
      "web",
      ProjectProps::default()
        .with_project_path("packages/web")
        .with_source_path("src")
        .with_dist_path("dist"),
    )
    .unwrap();

    assert_eq!(project.project_relative_source_path(&tree), "packages/web/src");
    assert_eq!(project.dist_path(&tree), "dist");
  }

  #[test]
  fn deep_children_stop_at_nested_projects() {
    let (mut tree, outer, inner, leaf) = nested();
    let tag = Tag::new("config");
    let mine = tree.attach(outer.node(), "mine").unwrap();
    let grouped = tree.attach(mine, "grouped").unwrap();
    tree.add_tag(mine, tag.clone());
    tree.add_tag(grouped, tag.clone());
    tree.add_tag(leaf, tag.clone());

    assert_eq!(outer.try_find_deep_children(&tree, &tag), vec![mine, grouped]);
    assert_eq!(inner.try_find_deep_children(&tree, &tag), vec![leaf]);
  }

  #[test]
  fn deep_child_cardinality() {
    let (mut tree, outer, inner, leaf) = nested();
    let tag = Tag::new("config");

    assert_eq!(outer.try_find_deep_child(&tree, &tag), None);
    assert!(matches!(
      outer.find_deep_child(&tree, &tag),
      Err(ConstructError::NotFound { .. })
    ));

    tree.add_tag(leaf, tag.clone());
    assert_eq!(inner.try_find_deep_child(&tree, &tag), Some(leaf));
    assert_eq!(inner.find_deep_child(&tree, &tag).unwrap(), leaf);

    let second = tree.attach(inner.node(), "second").unwrap();
    tree.add_tag(second, tag.clone());
    assert_eq!(inner.try_find_deep_child(&tree, &tag), None);
    assert_eq!(
      inner.find_deep_child(&tree, &tag),
      Err(ConstructError::NotFound {
        project: "workspace/outer/inner".to_string(),
        tag,
      })
    );
  }

  #[test]
  fn projects_lists_directly_nested_projects() {
    let (mut tree, outer, inner, _) = nested();
    let deeper = Project::create(
      &mut tree,
      inner.node(),
      "deeper",
      ProjectProps::default().with_project_path("x"),
    )
    .unwrap();

    assert_eq!(outer.projects(&tree), vec![inner]);
    assert_eq!(inner.projects(&tree), vec![deeper]);
    assert!(deeper.projects(&tree).is_empty());
  }

  #[test]
  fn nested_project_without_path_fails_validation() {
    let mut tree = Tree::new("workspace").unwrap();
    let root = tree.root();
    let outer = Project::create(&mut tree, root, "outer", ProjectProps::default()).unwrap();
    Project::create(&mut tree, outer.node(), "first", ProjectProps::default()).unwrap();
    Project::create(&mut tree, outer.node(), "second", ProjectProps::default()).unwrap();

    let report = validate_tree(&tree);
    let paths: Vec<_> = report.issues().iter().map(|i| i.path.as_str()).collect();
    assert_eq!(paths, ["workspace/outer/first", "workspace/outer/second"]);
  }

  #[test]
  fn top_level_project_needs_no_path() {
    let mut tree = Tree::new("workspace").unwrap();
    let root = tree.root();
    Project::create(&mut tree, root, "app", ProjectProps::default()).unwrap();
    assert!(validate_tree(&tree).is_empty());
  }
}
