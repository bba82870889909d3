use assetgraph_lib::compiler::{CompileResult, CompilerContext};
use assetgraph_lib::graph::CompilerInputAnalyzer;
use assetgraph_lib::package::PackageCompiler;
use assetgraph_lib::plan::ExecutionPlan;
use assetgraph_lib::roots::RootPackageAssetEnumerator;
use assetgraph_lib::step::{StepId, StepKind};

use super::common::{GAME_SESSION, load};

fn compile(document: &str, context: &CompilerContext) -> CompileResult {
  let loaded = load(document);
  let analyzer = CompilerInputAnalyzer::new(&loaded.session);
  let enumerator = RootPackageAssetEnumerator::new(&loaded.session, loaded.asset_types(), "Game");
  PackageCompiler::new(enumerator, &loaded.registry, &analyzer).prepare(context)
}

fn build_step(result: &CompileResult, location: &str) -> Option<StepId> {
  result.steps.ids().find(|id| match &result.steps.step(*id).kind {
    StepKind::AssetBuild { asset } => asset.location == location,
    _ => false,
  })
}

#[test]
fn scene_waits_for_texture_and_skips_material() {
  let result = compile(GAME_SESSION, &CompilerContext::default());

  assert!(!result.has_errors(), "unexpected errors: {:?}", result.log.messages());
  let scene = build_step(&result, "Scenes/Scene1").unwrap();
  let texture = build_step(&result, "Textures/Texture1").unwrap();
  assert_eq!(result.steps.links(scene), vec![texture]);
  assert!(build_step(&result, "Materials/Material1").is_none());
  assert!(build_step(&result, "Audio/Music1").is_none());
  assert!(build_step(&result, "GameSettings").is_some());
  assert_eq!(result.top_level().len(), 3);
}

#[test]
fn plan_orders_texture_before_scene() {
  let result = compile(GAME_SESSION, &CompilerContext::default());
  let plan = ExecutionPlan::from_graph(&result.steps).unwrap();

  let wave_of = |id: StepId| plan.waves().iter().position(|wave| wave.contains(&id)).unwrap();
  let scene = build_step(&result, "Scenes/Scene1").unwrap();
  let texture = build_step(&result, "Textures/Texture1").unwrap();
  assert!(wave_of(texture) < wave_of(scene));
  assert_eq!(plan.step_count(), result.steps.len());
  assert!(plan.dry_run(&result.steps).is_success());
}

#[test]
fn broken_runtime_dependency_fails_at_execution() {
  let mut context = CompilerContext::default();
  context.visit_runtime_types = true;
  let result = compile(GAME_SESSION, &context);

  assert!(!result.has_errors());
  assert!(
    result
      .log
      .messages()
      .iter()
      .any(|m| m.text.contains("Audio/Music1"))
  );

  let report = ExecutionPlan::from_graph(&result.steps)
    .unwrap()
    .dry_run(&result.steps);
  assert_eq!(report.failed.len(), 1);
  assert_eq!(report.failed[0].1[0].text, "unsupported codec");
  assert!(report.succeeded.contains(&build_step(&result, "Scenes/Scene1").unwrap()));
}

#[test]
fn broken_content_dependency_aborts() {
  let document = GAME_SESSION.replace(
    r#"{ "source": "art/t1.png" }"#,
    r#"{ "source": "art/t1.png", "errors": ["bad pixels"] }"#,
  );
  let result = compile(&document, &CompilerContext::default());

  assert!(result.has_errors());
  assert!(result.log.errors().any(|m| m.text == "bad pixels"));
  // Settings come after the scene root and are never reached.
  assert!(build_step(&result, "GameSettings").is_none());
}

#[test]
fn unknown_package_reports_and_builds_nothing() {
  let loaded = load(GAME_SESSION);
  let analyzer = CompilerInputAnalyzer::new(&loaded.session);
  let enumerator = RootPackageAssetEnumerator::new(&loaded.session, loaded.asset_types(), "Nope");

  let result = PackageCompiler::new(enumerator, &loaded.registry, &analyzer).prepare(&CompilerContext::default());
  assert!(result.has_errors());
  assert!(result.steps.is_empty());
}
