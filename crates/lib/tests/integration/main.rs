//! End-to-end tests driving a workspace through synthesis.

mod common;
mod entry_tests;
mod project_tests;
mod synth_tests;
