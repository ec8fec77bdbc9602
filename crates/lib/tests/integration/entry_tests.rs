//! Manifest entries contributing from elsewhere in a project.

use pdkit_lib::manifest::MergeMode;
use serde_json::json;

use super::common::TestWorkspace;

#[test]
fn entries_from_grouping_constructs_reach_the_project_manifest() {
  let mut t = TestWorkspace::new();
  let app = t.app.node();
  let tooling = t.ws.add_construct(app, "tooling").unwrap();
  t.ws
    .add_manifest_entry(tooling, "Lint", json!({"scripts": {"lint": "eslint ."}}), MergeMode::Deep)
    .unwrap();
  t.ws
    .add_manifest_entry(tooling, "Format", json!({"scripts": {"fmt": "prettier -w ."}}), MergeMode::Deep)
    .unwrap();
  t.ws
    .add_manifest_entry(app, "Meta", json!({"name": "demo", "private": true}), MergeMode::Shallow)
    .unwrap();

  t.ws.synth().unwrap();

  assert_eq!(
    t.read("package.json").unwrap(),
    "{\n  \"name\": \"demo\",\n  \"scripts\": {\n    \"lint\": \"eslint .\",\n    \"fmt\": \"prettier -w .\"\n  },\n  \"private\": true\n}\n"
  );
}

#[test]
fn detached_entries_do_not_contribute() {
  let mut t = TestWorkspace::new();
  let app = t.app.node();
  t.ws
    .add_manifest_entry(app, "Private", json!({"private": true}), MergeMode::Shallow)
    .unwrap();
  assert!(t.ws.tree_mut().try_remove_child(app, "Private").is_some());

  t.ws.synth().unwrap();

  assert_eq!(t.read("package.json").unwrap(), "{}\n");
}

#[test]
fn null_fields_leave_earlier_values() {
  let mut t = TestWorkspace::new();
  let app = t.app.node();
  t.ws
    .add_manifest_entry(app, "A", json!({"name": "demo", "main": "index.js"}), MergeMode::Shallow)
    .unwrap();
  t.ws
    .add_manifest_entry(app, "B", json!({"main": null}), MergeMode::Shallow)
    .unwrap();

  t.ws.synth().unwrap();

  assert_eq!(t.read("package.json").unwrap(), "{\n  \"name\": \"demo\",\n  \"main\": \"index.js\"\n}\n");
}
