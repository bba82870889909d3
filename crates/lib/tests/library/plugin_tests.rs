use std::sync::Arc;

use assetgraph_lib::asset::{AssetItem, AssetKind, AssetTypeInfo, AssetTypeRegistry, Package, PackageSession};
use assetgraph_lib::compiler::{
  AssetCompiler, CommandCompiler, CommandCompilerConfig, CompileResult, CompilerContext, CompilerDeclaration,
  CompilerPlugin, CompilerRegistry, ModuleEvent,
};
use assetgraph_lib::context::{ASSET, PREVIEW};
use assetgraph_lib::graph::{CompilerInputAnalyzer, DependencyGraphBuilder};
use assetgraph_lib::scope::{Capability, ScopeId};

struct ShaderPlugin;

impl CompilerPlugin for ShaderPlugin {
  fn asset_types(&self) -> Vec<AssetTypeInfo> {
    vec![AssetTypeInfo {
      kind: AssetKind::from("Shader"),
      always_root: false,
    }]
  }

  fn compilers(&self) -> Vec<CompilerDeclaration> {
    vec![CompilerDeclaration::new("Shader", &ASSET, || {
      Ok(Arc::new(CommandCompiler::new(CommandCompilerConfig::new("Shader", "compile-shader"))) as Arc<dyn AssetCompiler>)
    })]
  }
}

fn loaded(scope: &str) -> ModuleEvent {
  ModuleEvent::Loaded {
    scope: ScopeId::from(scope),
    capabilities: vec![Capability::AssetCompiler],
    plugin: Arc::new(ShaderPlugin),
  }
}

fn unloaded(scope: &str) -> ModuleEvent {
  ModuleEvent::Unloaded {
    scope: ScopeId::from(scope),
    capabilities: vec![Capability::AssetCompiler],
  }
}

fn shader() -> Arc<AssetItem> {
  Arc::new(AssetItem::new("shader", "Shaders/Lit", "Shader"))
}

fn compile(registry: &CompilerRegistry) -> CompileResult {
  let session = PackageSession::from_packages([Package::new("Game")]);
  let analyzer = CompilerInputAnalyzer::new(&session);
  DependencyGraphBuilder::new(registry, &analyzer).prepare(&CompilerContext::new(&PREVIEW), [shader()])
}

#[test]
fn loaded_plugin_compiles_and_unloading_removes_it() {
  let registry = CompilerRegistry::new(Arc::new(AssetTypeRegistry::new()));

  registry.notify(loaded("shaders"));
  assert_eq!(compile(&registry).top_level().len(), 1);
  assert_eq!(registry.registered_scopes(), vec![ScopeId::from("shaders")]);
  assert!(registry.asset_types().contains(&AssetKind::from("Shader")));

  registry.notify(unloaded("shaders"));
  let result = compile(&registry);
  assert!(!result.has_errors());
  assert!(result.top_level().is_empty());
  assert!(!registry.asset_types().contains(&AssetKind::from("Shader")));
}

#[test]
fn default_compiler_handles_unknown_kinds() {
  let fallback = Arc::new(CommandCompiler::new(CommandCompilerConfig::new("Any", "copy")));
  let registry = CompilerRegistry::new(Arc::new(AssetTypeRegistry::new())).with_default(fallback);

  let compiler = registry
    .get(&AssetKind::from("Shader"), &PREVIEW)
    .unwrap()
    .unwrap();
  let result = compiler
    .prepare(&CompilerContext::new(&PREVIEW), &AssetItem::new("s", "Shaders/Lit", "Shader"))
    .unwrap();
  assert!(!result.has_errors());
  assert_eq!(compile(&registry).top_level().len(), 1);
}

#[test]
fn events_without_compiler_capability_are_ignored() {
  let registry = CompilerRegistry::new(Arc::new(AssetTypeRegistry::new()));
  registry.notify(ModuleEvent::Loaded {
    scope: ScopeId::from("engine"),
    capabilities: vec![Capability::Engine],
    plugin: Arc::new(ShaderPlugin),
  });

  assert!(registry.get(&AssetKind::from("Shader"), &ASSET).unwrap().is_none());
  assert!(registry.registered_scopes().is_empty());
}
