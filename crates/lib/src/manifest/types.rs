//! The manifest payload.
//!
//! A manifest accumulates fields from any number of contributors over the
//! construct's lifetime and renders them into a single artifact. Rendering
//! always applies the configured key order first, so output is identical
//! across runs for identical trees.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::construct::{NodeId, Tree};
use crate::files::FileSynthesizer;

use super::merge::{Fields, IntoFields, MergeMode, deep_merge, order_fields, shallow_merge};

/// Serialization format of a manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestFormat {
  /// Pretty-printed JSON with two-space indentation.
  #[default]
  Json,
  Yaml,
}

/// Errors that can occur when rendering a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to serialize JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("failed to serialize YAML: {0}")]
  Yaml(#[from] serde_yaml::Error),
}

/// Read-only view handed to field resolvers.
pub struct ResolveContext<'a> {
  pub tree: &'a Tree,
  pub files: &'a dyn FileSynthesizer,
  /// The manifest construct.
  pub node: NodeId,
  /// The field being resolved.
  pub field: &'a str,
}

/// A late-stage field resolver: receives the current value of its field and
/// returns the finalized one.
pub type FieldResolver = Box<dyn FnMut(&ResolveContext<'_>, Value) -> anyhow::Result<Value>>;

/// Accumulated fields of a single output artifact.
pub struct Manifest {
  file_name: String,
  fields: Fields,
  key_order: Vec<String>,
  format: ManifestFormat,
  trailing_newline: bool,
  resolvers: Vec<(String, FieldResolver)>,
}

impl Manifest {
  /// Create an empty manifest written as `file_name` inside its project.
  pub fn new(file_name: impl Into<String>) -> Self {
    Self {
      file_name: file_name.into(),
      fields: Fields::new(),
      key_order: Vec::new(),
      format: ManifestFormat::default(),
      trailing_newline: true,
      resolvers: Vec::new(),
    }
  }

  pub fn with_format(mut self, format: ManifestFormat) -> Self {
    self.format = format;
    self
  }

  /// Keys to emit first, in this order.
  pub fn with_key_order<I, S>(mut self, keys: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.key_order = keys.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_trailing_newline(mut self, enabled: bool) -> Self {
    self.trailing_newline = enabled;
    self
  }

  pub fn file_name(&self) -> &str {
    &self.file_name
  }

  pub fn format(&self) -> ManifestFormat {
    self.format
  }

  pub fn key_order(&self) -> &[String] {
    &self.key_order
  }

  pub fn fields(&self) -> &Fields {
    &self.fields
  }

  pub fn field(&self, key: &str) -> Option<&Value> {
    self.fields.get(key)
  }

  /// Merge fields, replacing top-level values.
  pub fn add_shallow_fields(&mut self, fields: impl IntoFields) {
    shallow_merge(&mut self.fields, fields.into_fields());
  }

  /// Merge fields, combining nested objects key by key.
  pub fn add_deep_fields(&mut self, fields: impl IntoFields) {
    deep_merge(&mut self.fields, fields.into_fields());
  }

  pub fn add_fields(&mut self, fields: impl IntoFields, mode: MergeMode) {
    match mode {
      MergeMode::Shallow => self.add_shallow_fields(fields),
      MergeMode::Deep => self.add_deep_fields(fields),
    }
  }

  /// Set a single field, or remove it when `value` is `null`.
  pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
    let key = key.into();
    if value.is_null() {
      self.fields.shift_remove(&key);
    } else {
      self.fields.insert(key, value);
    }
  }

  pub fn remove_field(&mut self, key: &str) -> Option<Value> {
    self.fields.shift_remove(key)
  }

  /// Register a resolver for `field`, run once during the late stage.
  ///
  /// Resolvers run after every hook of that stage has run across the tree,
  /// in registration order. A resolver is skipped when its field is absent.
  pub fn add_field_resolver<F>(&mut self, field: impl Into<String>, resolver: F)
  where
    F: FnMut(&ResolveContext<'_>, Value) -> anyhow::Result<Value> + 'static,
  {
    self.resolvers.push((field.into(), Box::new(resolver)));
  }

  pub fn resolver_count(&self) -> usize {
    self.resolvers.len()
  }

  pub(crate) fn take_resolvers(&mut self) -> Vec<(String, FieldResolver)> {
    std::mem::take(&mut self.resolvers)
  }

  pub(crate) fn restore_resolvers(&mut self, mut resolvers: Vec<(String, FieldResolver)>) {
    resolvers.append(&mut self.resolvers);
    self.resolvers = resolvers;
  }

  /// Apply the key order to the stored fields.
  pub fn finalize(&mut self) {
    self.fields = self.ordered_fields();
  }

  /// The fields in output order.
  pub fn ordered_fields(&self) -> Fields {
    order_fields(&self.fields, &self.key_order)
  }

  /// Serialize the ordered fields.
  pub fn render(&self) -> Result<Vec<u8>, ManifestError> {
    let fields = self.ordered_fields();
    let mut out = match self.format {
      ManifestFormat::Json => serde_json::to_string_pretty(&fields)?,
      ManifestFormat::Yaml => serde_yaml::to_string(&fields)?,
    };
    if self.trailing_newline && !out.ends_with('\n') {
      out.push('\n');
    } else if !self.trailing_newline {
      while out.ends_with('\n') {
        out.pop();
      }
    }
    Ok(out.into_bytes())
  }
}

impl std::fmt::Debug for Manifest {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Manifest")
      .field("file_name", &self.file_name)
      .field("fields", &self.fields)
      .field("key_order", &self.key_order)
      .field("format", &self.format)
      .field("trailing_newline", &self.trailing_newline)
      .field("resolvers", &self.resolvers.iter().map(|(k, _)| k).collect::<Vec<_>>())
      .finish()
  }
}
