//! Full synthesis runs.

use pdkit_lib::files::MemoryFiles;
use pdkit_lib::lifecycle::LifeCycle;
use pdkit_lib::manifest::{Manifest, ManifestFormat, unresolved_entries};
use pdkit_lib::workspace::SynthError;
use serde_json::json;

use super::common::TestWorkspace;

#[test]
fn unresolved_dependencies_resolve_from_files() {
  let files = MemoryFiles::new().with_file("versions.json", r#"{"foo": "1.2.3"}"#);
  let mut t = TestWorkspace::with_files(files);
  let manifest = t.ws.tree_mut().manifest_mut(t.manifest).unwrap();
  manifest.add_shallow_fields(json!({"name": "demo", "dependencies": {"foo": "*"}}));
  manifest.add_field_resolver(
    "dependencies",
    unresolved_entries(|ctx, dep| ctx.files.try_read_json("versions.json")?.get(dep).cloned()),
  );

  assert!(t.ws.validate().is_empty());
  let report = t.ws.synth().unwrap();

  assert_eq!(report.files.len(), 1);
  assert_eq!(
    t.read("package.json").unwrap(),
    "{\n  \"name\": \"demo\",\n  \"dependencies\": {\n    \"foo\": \"1.2.3\"\n  }\n}\n"
  );
}

#[test]
fn late_stage_contributions_are_resolved() {
  let files = MemoryFiles::new().with_file("versions.json", r#"{"foo": "1.2.3", "bar": "2.0.0"}"#);
  let mut t = TestWorkspace::with_files(files);
  let manifest = t.ws.tree_mut().manifest_mut(t.manifest).unwrap();
  manifest.add_shallow_fields(json!({"name": "demo", "dependencies": {"foo": "*"}}));
  manifest.add_field_resolver(
    "dependencies",
    unresolved_entries(|ctx, dep| ctx.files.try_read_json("versions.json")?.get(dep).cloned()),
  );

  let app = t.app.node();
  let package = t.manifest;
  let tool = t.ws.add_construct(app, "tool").unwrap();
  t.ws.tree_mut().add_hook(tool, LifeCycle::Synth, move |ctx| {
    ctx
      .tree
      .expect_manifest_mut(package)?
      .add_deep_fields(json!({"dependencies": {"bar": "*"}}));
    Ok(())
  });

  t.ws.synth().unwrap();

  let out = t.read("package.json").unwrap();
  assert!(!out.contains("\"*\""));
  assert_eq!(
    out,
    "{\n  \"name\": \"demo\",\n  \"dependencies\": {\n    \"bar\": \"2.0.0\",\n    \"foo\": \"1.2.3\"\n  }\n}\n"
  );
}

#[test]
fn hooks_contribute_before_rendering() {
  let mut t = TestWorkspace::new();
  let manifest = t.manifest;
  t.ws.tree_mut().add_hook(t.app.node(), LifeCycle::BeforeSynth, move |ctx| {
    ctx
      .tree
      .expect_manifest_mut(manifest)?
      .add_deep_fields(json!({"scripts": {"build": "tsc"}}));
    Ok(())
  });
  t.ws.tree_mut().add_hook(t.app.node(), LifeCycle::AfterSynth, move |ctx| {
    ctx
      .tree
      .expect_manifest_mut(manifest)?
      .add_deep_fields(json!({"scripts": {"test": "jest"}}));
    Ok(())
  });

  let report = t.ws.synth().unwrap();

  assert_eq!(report.stages.len(), 4);
  assert_eq!(report.stages[1].stage, LifeCycle::BeforeSynth);
  assert_eq!(report.stages[1].hooks_run, 1);
  assert_eq!(
    t.read("package.json").unwrap(),
    "{\n  \"scripts\": {\n    \"build\": \"tsc\",\n    \"test\": \"jest\"\n  }\n}\n"
  );
}

#[test]
fn yaml_manifests_render_as_yaml() {
  let mut t = TestWorkspace::new();
  let app = t.app.node();
  let node = t
    .ws
    .add_manifest(app, Manifest::new("pnpm-workspace.yaml").with_format(ManifestFormat::Yaml))
    .unwrap();
  t.ws
    .tree_mut()
    .manifest_mut(node)
    .unwrap()
    .add_shallow_fields(json!({"packages": ["packages/*"]}));

  t.ws.synth().unwrap();

  assert_eq!(t.read("pnpm-workspace.yaml").unwrap(), "packages:\n- packages/*\n");
}

#[test]
fn resolver_failure_names_field() {
  let mut t = TestWorkspace::new();
  let manifest = t.ws.tree_mut().manifest_mut(t.manifest).unwrap();
  manifest.add_shallow_fields(json!({"dependencies": {"foo": "*"}}));
  manifest.add_field_resolver("dependencies", |_, _| anyhow::bail!("lockfile missing"));

  let err = t.ws.synth().unwrap_err();

  assert!(matches!(err, SynthError::LifeCycle(_)));
  assert_eq!(
    err.to_string(),
    "resolver for field 'dependencies' of 'workspace/app/package.json' failed: lockfile missing"
  );
  assert!(t.read("package.json").is_none());
}

#[test]
fn rerun_is_stable() {
  let mut t = TestWorkspace::new();
  t.ws
    .tree_mut()
    .manifest_mut(t.manifest)
    .unwrap()
    .add_shallow_fields(json!({"version": "0.1.0", "name": "demo"}));

  let first = t.ws.synth().unwrap();
  let content = t.read("package.json").unwrap();
  let second = t.ws.synth().unwrap();

  assert_eq!(first.changed(), 1);
  assert_eq!(second.changed(), 0);
  assert_eq!(t.read("package.json").unwrap(), content);
}
