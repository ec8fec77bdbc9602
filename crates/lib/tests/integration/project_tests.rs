//! Project placement and nesting rules.

use pdkit_lib::manifest::Manifest;
use pdkit_lib::project::{Project, ProjectProps};
use pdkit_lib::workspace::SynthError;
use serde_json::json;

use super::common::TestWorkspace;

#[test]
fn nested_projects_synthesize_into_their_paths() {
  let mut t = TestWorkspace::new();
  let app = t.app.node();
  let services = t.ws.add_construct(app, "services").unwrap();
  let api = t
    .ws
    .add_project(services, "api", ProjectProps::default().with_project_path("services/api"))
    .unwrap();
  let v2 = t
    .ws
    .add_project(api.node(), "v2", ProjectProps::default().with_project_path("v2"))
    .unwrap();
  let manifest = t.ws.add_manifest(v2.node(), Manifest::new("package.json")).unwrap();
  t.ws
    .tree_mut()
    .manifest_mut(manifest)
    .unwrap()
    .add_shallow_fields(json!({"name": "api-v2"}));

  let tree = t.ws.tree();
  assert_eq!(Project::of(tree, manifest).unwrap(), v2);
  assert_eq!(v2.parent(tree), Some(api));
  assert_eq!(api.parent(tree), Some(t.app));
  assert_eq!(v2.project_relative_path(tree), "services/api/v2");

  let report = t.ws.synth().unwrap();

  assert!(report.file("services/api/v2/package.json").is_some());
  assert_eq!(t.read("services/api/v2/package.json").unwrap(), "{\n  \"name\": \"api-v2\"\n}\n");
}

#[test]
fn every_invalid_project_is_reported() {
  let mut t = TestWorkspace::new();
  let app = t.app.node();
  t.ws.add_project(app, "web", ProjectProps::default()).unwrap();
  t.ws.add_project(app, "docs", ProjectProps::default()).unwrap();
  t.ws
    .add_project(app, "cli", ProjectProps::default().with_project_path("cli"))
    .unwrap();

  let err = t.ws.synth().unwrap_err();

  let SynthError::Validation(report) = err else {
    panic!("expected validation failure, got {err}");
  };
  let paths: Vec<_> = report.issues().iter().map(|i| i.path.as_str()).collect();
  assert_eq!(paths, ["workspace/app/web", "workspace/app/docs"]);
  assert!(
    report
      .issues()
      .iter()
      .all(|i| i.message == "nested projects must explicitly define a project_path")
  );
  assert!(t.read("package.json").is_none());
}

#[test]
fn deep_children_stop_at_nested_projects() {
  let mut t = TestWorkspace::new();
  let app = t.app.node();
  let lib = t
    .ws
    .add_project(app, "lib", ProjectProps::default().with_project_path("lib"))
    .unwrap();
  let lib_manifest = t.ws.add_manifest(lib.node(), Manifest::new("package.json")).unwrap();

  let tree = t.ws.tree();
  let tag = pdkit_lib::construct::Tag::MANIFEST;
  assert_eq!(t.app.try_find_deep_children(tree, &tag), vec![t.manifest]);
  assert_eq!(lib.find_deep_child(tree, &tag).unwrap(), lib_manifest);
  assert_eq!(t.app.projects(tree), vec![lib]);
}
