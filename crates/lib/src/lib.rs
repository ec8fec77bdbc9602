//! pdkit-lib: project-definition constructs and manifest synthesis
//!
//! A workspace is described as a tree of constructs and synthesized into
//! on-disk manifest files:
//! - `construct`: the arena-backed construct tree, tags and queries
//! - `lifecycle`: ordered stages with per-construct hooks
//! - `project`: constructs owning a directory in the workspace
//! - `manifest`: mergeable key/value artifacts and late field resolvers
//! - `workspace`: the tree root that validates and writes everything

pub mod construct;
pub mod consts;
pub mod files;
pub mod lifecycle;
pub mod manifest;
pub mod project;
pub mod util;
pub mod validate;
pub mod workspace;
