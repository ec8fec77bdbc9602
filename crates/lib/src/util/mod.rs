//! Shared utilities.
//!
//! Content hashing for synthesized artifacts and POSIX-style path joining for
//! project paths.

pub mod hash;
pub mod path;
