//! Pure field-merge functions.
//!
//! These operate on plain [`Fields`] maps and know nothing about the tree, so
//! they can be tested and reused on their own. JSON has no `undefined`;
//! `null` plays that role here and is never stored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An insertion-ordered field map.
pub type Fields = serde_json::Map<String, Value>;

/// How incoming fields combine with existing ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
  /// Top-level keys replace existing values wholesale.
  #[default]
  Shallow,
  /// Nested objects merge key by key; other values replace.
  Deep,
}

/// Conversion into a [`Fields`] map.
///
/// Implemented for maps, for JSON values (a non-object contributes nothing)
/// and for key/value lists.
pub trait IntoFields {
  fn into_fields(self) -> Fields;
}

impl IntoFields for Fields {
  fn into_fields(self) -> Fields {
    self
  }
}

impl IntoFields for Value {
  fn into_fields(self) -> Fields {
    match self {
      Value::Object(map) => map,
      _ => Fields::new(),
    }
  }
}

impl<K: Into<String>> IntoFields for Vec<(K, Value)> {
  fn into_fields(self) -> Fields {
    self.into_iter().map(|(k, v)| (k.into(), v)).collect()
  }
}

/// Merge `incoming` into `existing`, replacing top-level values.
///
/// `null` values are dropped; a replaced key keeps its original position.
pub fn shallow_merge(existing: &mut Fields, incoming: Fields) {
  for (key, value) in incoming {
    if value.is_null() {
      continue;
    }
    existing.insert(key, value);
  }
}

/// Merge `incoming` into `existing`, recursing into nested objects.
///
/// Objects merge key by key at every depth; scalars and arrays replace
/// (last writer wins at the leaf); `null` leaves are dropped.
pub fn deep_merge(existing: &mut Fields, incoming: Fields) {
  for (key, value) in incoming {
    match value {
      Value::Null => {}
      Value::Object(incoming_obj) => match existing.get_mut(&key) {
        Some(Value::Object(existing_obj)) => deep_merge(existing_obj, incoming_obj),
        _ => {
          let mut fresh = Fields::new();
          deep_merge(&mut fresh, incoming_obj);
          existing.insert(key, Value::Object(fresh));
        }
      },
      leaf => {
        existing.insert(key, leaf);
      }
    }
  }
}

/// Merge without mutating the input: `(existing, incoming, mode) -> merged`.
pub fn merge_fields(existing: &Fields, incoming: Fields, mode: MergeMode) -> Fields {
  let mut merged = existing.clone();
  match mode {
    MergeMode::Shallow => shallow_merge(&mut merged, incoming),
    MergeMode::Deep => deep_merge(&mut merged, incoming),
  }
  merged
}

/// Reorder `fields` so keys named in `priority` come first, in list order.
///
/// Keys not in the list follow in their existing order. Priority entries
/// without a matching field are ignored.
pub fn order_fields<S: AsRef<str>>(fields: &Fields, priority: &[S]) -> Fields {
  let mut ordered = Fields::new();
  for key in priority {
    let key = key.as_ref();
    if let Some(value) = fields.get(key) {
      if !ordered.contains_key(key) {
        ordered.insert(key.to_string(), value.clone());
      }
    }
  }
  for (key, value) in fields {
    if !ordered.contains_key(key) {
      ordered.insert(key.clone(), value.clone());
    }
  }
  ordered
}

/// Sort a map's keys lexicographically.
pub fn sort_keys(fields: Fields) -> Fields {
  let mut entries: Vec<_> = fields.into_iter().collect();
  entries.sort_by(|a, b| a.0.cmp(&b.0));
  entries.into_iter().collect()
}
