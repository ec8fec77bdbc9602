//! Validation aggregation.
//!
//! Constructs register rules with [`Tree::add_validation`]. Rules are never
//! evaluated at the point of definition; [`validate_tree`] walks the finished
//! tree once and runs every rule of every attached construct, collecting all
//! messages instead of stopping at the first.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::construct::{NodeId, Tree};

/// A validation rule: returns zero or more error messages for the construct it
/// was registered on.
pub type ValidationRule = Box<dyn Fn(&Tree, NodeId) -> Vec<String>>;

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
  /// Path of the construct the rule was registered on.
  pub path: String,
  pub message: String,
}

impl std::fmt::Display for ValidationIssue {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: {}", self.path, self.message)
  }
}

/// Every issue found by one validation pass, in tree order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
  issues: Vec<ValidationIssue>,
}

impl ValidationReport {
  pub fn issues(&self) -> &[ValidationIssue] {
    &self.issues
  }

  pub fn is_empty(&self) -> bool {
    self.issues.is_empty()
  }

  pub fn len(&self) -> usize {
    self.issues.len()
  }

  /// Issues reported for the construct at `path`.
  pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
    self.issues.iter().filter(move |i| i.path == path)
  }
}

impl std::fmt::Display for ValidationReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "validation failed with {} error(s)", self.issues.len())?;
    for issue in &self.issues {
      write!(f, "\n  {issue}")?;
    }
    Ok(())
  }
}

/// Run every validation rule in the tree.
pub fn validate_tree(tree: &Tree) -> ValidationReport {
  let mut issues = Vec::new();

  for node in tree.find_all(tree.root()) {
    let rules = &tree.node(node).validations;
    if rules.is_empty() {
      continue;
    }
    let path = tree.path(node);
    for rule in rules {
      issues.extend(rule(tree, node).into_iter().map(|message| ValidationIssue {
        path: path.clone(),
        message,
      }));
    }
  }

  debug!(issues = issues.len(), "validation complete");
  ValidationReport { issues }
}
