//! The construct tree.
//!
//! Every domain object (workspace, project, manifest, ...) is a construct: a
//! node in a single [`Tree`] with an id, ordered children, capability
//! [`Tag`]s, validation rules and lifecycle hooks.

mod tree;
mod types;

pub use tree::Tree;
pub use types::*;
