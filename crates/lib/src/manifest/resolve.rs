//! Late-stage field resolution.
//!
//! Some fields can only be finalized once the whole tree has contributed, for
//! example dependency maps whose entries start out as an unresolved marker
//! (`"*"`) and are filled in from files on disk or sibling projects. A
//! manifest registers a resolver per field; the scheduler runs them at the end
//! of [`RESOLVER_STAGE`], after that stage's hooks have run tree-wide.

use serde_json::Value;
use tracing::debug;

use crate::consts::UNRESOLVED_MARKER;
use crate::construct::{NodeId, Tree};
use crate::files::FileSynthesizer;
use crate::lifecycle::{LifeCycle, LifeCycleError};

use super::merge::{Fields, sort_keys};
use super::types::ResolveContext;

/// Stage during which field resolvers run.
pub const RESOLVER_STAGE: LifeCycle = LifeCycle::Synth;

/// Run the field resolvers of the manifest at `node`, if it is one.
///
/// Returns the number of resolvers that ran.
pub fn run_field_resolvers(
  tree: &mut Tree,
  files: &dyn FileSynthesizer,
  node: NodeId,
) -> Result<usize, LifeCycleError> {
  let mut resolvers = match tree.manifest_mut(node) {
    Some(manifest) if manifest.resolver_count() > 0 => manifest.take_resolvers(),
    _ => return Ok(0),
  };

  let mut ran = 0;
  let mut result = Ok(());

  for (field, resolver) in resolvers.iter_mut() {
    let Some(current) = tree.manifest(node).and_then(|m| m.field(field)).cloned() else {
      debug!(path = %tree.path(node), field = %field, "field absent, resolver skipped");
      continue;
    };

    let ctx = ResolveContext {
      tree: &*tree,
      files,
      node,
      field: field.as_str(),
    };
    match resolver(&ctx, current) {
      Ok(resolved) => {
        if let Some(manifest) = tree.manifest_mut(node) {
          manifest.set_field(field.clone(), resolved);
        }
        ran += 1;
      }
      Err(source) => {
        result = Err(LifeCycleError::Resolver {
          path: tree.path(node),
          field: field.clone(),
          source,
        });
        break;
      }
    }
  }

  if let Some(manifest) = tree.manifest_mut(node) {
    manifest.restore_resolvers(resolvers);
  }
  result.map(|()| ran)
}

/// Replace unresolved entries of a mapping and sort it by key.
///
/// Every entry whose value is the string `marker` is passed to `lookup`; a
/// returned value replaces it, `None` leaves the marker in place. Values that
/// are not objects are returned unchanged.
pub fn resolve_unresolved<F>(value: Value, marker: &str, mut lookup: F) -> Value
where
  F: FnMut(&str) -> Option<Value>,
{
  let Value::Object(entries) = value else {
    return value;
  };

  let resolved: Fields = entries
    .into_iter()
    .map(|(key, current)| {
      if current.as_str() == Some(marker) {
        let replacement = lookup(&key).unwrap_or(current);
        (key, replacement)
      } else {
        (key, current)
      }
    })
    .collect();

  Value::Object(sort_keys(resolved))
}

/// Build a field resolver that resolves `"*"` entries through `lookup`.
///
/// This is the dependency-field pattern: register it for each mapping-valued
/// field whose entries may be declared without a concrete value.
pub fn unresolved_entries<F>(mut lookup: F) -> impl FnMut(&ResolveContext<'_>, Value) -> anyhow::Result<Value>
where
  F: FnMut(&ResolveContext<'_>, &str) -> Option<Value>,
{
  move |ctx, value| Ok(resolve_unresolved(value, UNRESOLVED_MARKER, |key| lookup(ctx, key)))
}
