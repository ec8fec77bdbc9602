//! Staged lifecycle execution.
//!
//! The scheduler runs every [`LifeCycle`] stage across the whole tree before
//! the next one starts for any construct. Within a stage, constructs are
//! visited in pre-order and each construct's hooks for that stage run in
//! registration order.
//!
//! # Structural changes during a stage
//!
//! Each pass works on a snapshot of the tree taken when the stage starts:
//! - constructs attached during a stage do not receive that stage's hooks, but
//!   receive every later stage
//! - constructs detached during a stage are skipped for the rest of it
//! - hooks registered on a construct while its hooks are running take effect
//!   from the next stage on
//!
//! # Field resolvers
//!
//! Manifest field resolvers run once the [`RESOLVER_STAGE`] pass has finished
//! for every construct, so they see every contribution made by that stage's
//! hooks. They visit manifests in pre-order, including ones attached during
//! the pass, and complete before the next stage starts.
//!
//! # Failure
//!
//! The first hook or resolver error aborts the run: no further hooks of the
//! current stage and no later stages execute.

mod types;

pub use types::*;

use tracing::{debug, info};

use crate::construct::{NodeId, Tree};
use crate::files::FileSynthesizer;
use crate::manifest::{RESOLVER_STAGE, run_field_resolvers};

/// Run a single stage over the whole tree.
pub fn run_stage(
  tree: &mut Tree,
  files: &dyn FileSynthesizer,
  stage: LifeCycle,
) -> Result<StageSummary, LifeCycleError> {
  let snapshot = tree.find_all(tree.root());
  let mut summary = StageSummary {
    stage,
    visited: 0,
    hooks_run: 0,
    resolvers_run: 0,
  };

  for node in snapshot {
    if !tree.is_attached(node) {
      debug!(stage = %stage, path = %tree.path(node), "skipping detached construct");
      continue;
    }
    summary.visited += 1;

    if tree.node(node).hook_count(stage) > 0 {
      summary.hooks_run += run_node_hooks(tree, files, node, stage)?;
    }
  }

  if stage == RESOLVER_STAGE {
    for node in tree.find_all(tree.root()) {
      summary.resolvers_run += run_field_resolvers(tree, files, node)?;
    }
  }

  info!(
    stage = %stage,
    visited = summary.visited,
    hooks = summary.hooks_run,
    resolvers = summary.resolvers_run,
    "lifecycle stage complete"
  );
  Ok(summary)
}

/// Run every stage in order, stopping at the first failure.
pub fn run_all(tree: &mut Tree, files: &dyn FileSynthesizer) -> Result<Vec<StageSummary>, LifeCycleError> {
  LifeCycle::ALL
    .into_iter()
    .map(|stage| run_stage(tree, files, stage))
    .collect()
}

fn run_node_hooks(
  tree: &mut Tree,
  files: &dyn FileSynthesizer,
  node: NodeId,
  stage: LifeCycle,
) -> Result<usize, LifeCycleError> {
  let mut hooks = tree.take_hooks(node);
  let mut ran = 0;
  let mut result = Ok(());

  for (hook_stage, hook) in hooks.iter_mut() {
    if *hook_stage != stage {
      continue;
    }
    let mut ctx = HookContext {
      tree: &mut *tree,
      files,
      node,
      stage,
    };
    if let Err(source) = hook(&mut ctx) {
      result = Err(LifeCycleError::Hook {
        stage,
        path: tree.path(node),
        source,
      });
      break;
    }
    ran += 1;
  }

  tree.restore_hooks(node, hooks);
  result.map(|()| ran)
}
