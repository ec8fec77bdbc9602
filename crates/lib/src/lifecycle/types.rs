//! Stage, hook and error types for lifecycle execution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::construct::{NodeId, Tree};
use crate::files::FileSynthesizer;

/// A lifecycle stage.
///
/// Stages are totally ordered and always run in [`LifeCycle::ALL`] order.
/// `Init` and `BeforeSynth` are for declarative contributions, `Synth` is the
/// late stage where computed values and field resolvers run, and `AfterSynth`
/// sees every manifest in its final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeCycle {
  Init,
  BeforeSynth,
  Synth,
  AfterSynth,
}

impl LifeCycle {
  pub const ALL: [LifeCycle; 4] = [
    LifeCycle::Init,
    LifeCycle::BeforeSynth,
    LifeCycle::Synth,
    LifeCycle::AfterSynth,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      LifeCycle::Init => "init",
      LifeCycle::BeforeSynth => "before_synth",
      LifeCycle::Synth => "synth",
      LifeCycle::AfterSynth => "after_synth",
    }
  }
}

impl std::fmt::Display for LifeCycle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What a hook gets to work with.
///
/// The tree is mutable: hooks may merge fields into any manifest, register
/// validations, and attach or remove constructs (see the scheduler docs for how
/// structural changes interact with the running stage).
pub struct HookContext<'a> {
  pub tree: &'a mut Tree,
  pub files: &'a dyn FileSynthesizer,
  /// The construct the hook was registered on.
  pub node: NodeId,
  pub stage: LifeCycle,
}

/// A lifecycle hook.
pub type Hook = Box<dyn FnMut(&mut HookContext<'_>) -> anyhow::Result<()>>;

/// Per-stage execution counts, for logging and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
  pub stage: LifeCycle,
  /// Attached constructs visited by the pass.
  pub visited: usize,
  pub hooks_run: usize,
  pub resolvers_run: usize,
}

/// Errors that abort lifecycle execution.
#[derive(Debug, Error)]
pub enum LifeCycleError {
  /// A hook returned an error.
  #[error("{stage} hook on '{path}' failed: {source}")]
  Hook {
    stage: LifeCycle,
    path: String,
    #[source]
    source: anyhow::Error,
  },

  /// A manifest field resolver returned an error.
  #[error("resolver for field '{field}' of '{path}' failed: {source}")]
  Resolver {
    path: String,
    field: String,
    #[source]
    source: anyhow::Error,
  },
}
