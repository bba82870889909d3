//! Registry of asset compilers.
//!
//! Compilers are stored per `(asset kind, compilation context)` pair. Lookups
//! fall back along the context hierarchy and finally to a default compiler.
//!
//! Modules announce themselves through [`ModuleEvent`]s. Events are only
//! queued when they arrive; the declarations of loaded plugins are validated
//! and instantiated the next time the registry is queried, so a burst of
//! load/unload events costs one pass.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::types::{AssetCompiler, CompilerError};
use crate::asset::{AssetKind, AssetTypeInfo, AssetTypeRegistry};
use crate::context::ContextRef;
use crate::scope::{Capability, ScopeId};

#[derive(Debug, Error)]
pub enum RegistryError {
  /// A thread panicked while holding one of the registry's locks.
  #[error("compiler registry lock poisoned")]
  Poisoned,
}

/// Creates a compiler instance for a declaration.
pub type CompilerFactory = Arc<dyn Fn() -> Result<Arc<dyn AssetCompiler>, CompilerError> + Send + Sync>;

/// A compiler a plugin offers for one asset kind and context.
#[derive(Clone)]
pub struct CompilerDeclaration {
  /// Name of the asset kind, resolved against the asset type registry.
  pub asset_kind: String,
  pub context: ContextRef,
  pub factory: CompilerFactory,
}

impl CompilerDeclaration {
  pub fn new<F>(asset_kind: &str, context: ContextRef, factory: F) -> Self
  where
    F: Fn() -> Result<Arc<dyn AssetCompiler>, CompilerError> + Send + Sync + 'static,
  {
    Self {
      asset_kind: asset_kind.to_string(),
      context,
      factory: Arc::new(factory),
    }
  }
}

impl fmt::Debug for CompilerDeclaration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CompilerDeclaration")
      .field("asset_kind", &self.asset_kind)
      .field("context", &self.context.name())
      .finish()
  }
}

/// A loadable module contributing compilers.
pub trait CompilerPlugin: Send + Sync {
  /// Asset kinds introduced by the plugin. They are owned by its scope.
  fn asset_types(&self) -> Vec<AssetTypeInfo> {
    Vec::new()
  }

  fn compilers(&self) -> Vec<CompilerDeclaration>;
}

/// Lifecycle notification from the module system.
#[derive(Clone)]
pub enum ModuleEvent {
  Loaded {
    scope: ScopeId,
    capabilities: Vec<Capability>,
    plugin: Arc<dyn CompilerPlugin>,
  },
  Unloaded {
    scope: ScopeId,
    capabilities: Vec<Capability>,
  },
}

impl ModuleEvent {
  fn provides_compilers(&self) -> bool {
    let capabilities = match self {
      ModuleEvent::Loaded { capabilities, .. } | ModuleEvent::Unloaded { capabilities, .. } => capabilities,
    };
    capabilities.contains(&Capability::AssetCompiler)
  }
}

enum PendingChange {
  Load(ScopeId, Arc<dyn CompilerPlugin>),
  Unload(ScopeId),
}

#[derive(Default)]
struct PendingState {
  pending: Vec<PendingChange>,
  registered_scopes: HashSet<ScopeId>,
}

#[derive(Clone)]
struct Registration {
  compiler: Arc<dyn AssetCompiler>,
  scope: ScopeId,
}

type CompilerMap = HashMap<AssetKind, HashMap<ContextRef, Registration>>;

pub struct CompilerRegistry {
  types: Arc<AssetTypeRegistry>,
  compilers: RwLock<CompilerMap>,
  default_compiler: Option<Arc<dyn AssetCompiler>>,

  /// Pending module events and the scopes currently loaded.
  state: Mutex<PendingState>,

  /// Held while drained events are applied, so batches apply in queue order.
  materializing: Mutex<()>,
}

impl fmt::Debug for CompilerRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CompilerRegistry")
      .field("registrations", &self.len())
      .field("has_default", &self.default_compiler.is_some())
      .finish()
  }
}

impl CompilerRegistry {
  pub fn new(types: Arc<AssetTypeRegistry>) -> Self {
    Self {
      types,
      compilers: RwLock::new(HashMap::new()),
      default_compiler: None,
      state: Mutex::new(PendingState::default()),
      materializing: Mutex::new(()),
    }
  }

  /// Compiler returned when no registration matches.
  pub fn with_default(mut self, compiler: Arc<dyn AssetCompiler>) -> Self {
    self.default_compiler = Some(compiler);
    self
  }

  pub fn asset_types(&self) -> &Arc<AssetTypeRegistry> {
    &self.types
  }

  /// Register `compiler` for the exact `(kind, context)` pair, replacing any
  /// previous registration. The registration belongs to the builtin scope.
  pub fn register(&self, kind: AssetKind, context: ContextRef, compiler: Arc<dyn AssetCompiler>) {
    self.insert(kind, context, compiler, ScopeId::builtin());
  }

  fn insert(&self, kind: AssetKind, context: ContextRef, compiler: Arc<dyn AssetCompiler>, scope: ScopeId) {
    debug!(kind = %kind, context = %context, scope = %scope, "registering compiler");
    match self.compilers.write() {
      Ok(mut compilers) => {
        compilers
          .entry(kind)
          .or_default()
          .insert(context, Registration { compiler, scope });
      }
      Err(_) => warn!(kind = %kind, "compiler registry poisoned, registration dropped"),
    }
  }

  /// Find the compiler for `kind` in `context`.
  ///
  /// Tries the exact context first, then each ancestor, then the default
  /// compiler. Pending module events are applied before the lookup.
  pub fn get(&self, kind: &AssetKind, context: ContextRef) -> Result<Option<Arc<dyn AssetCompiler>>, RegistryError> {
    self.materialize_pending()?;

    let compilers = self.compilers.read().map_err(|_| RegistryError::Poisoned)?;
    if let Some(by_context) = compilers.get(kind) {
      for ctx in context.ancestors() {
        if let Some(registration) = by_context.get(ctx) {
          trace!(kind = %kind, requested = %context, resolved = %ctx, "compiler found");
          return Ok(Some(registration.compiler.clone()));
        }
      }
    }

    trace!(kind = %kind, context = %context, "no compiler registered, using default");
    Ok(self.default_compiler.clone())
  }

  /// Remove every registration whose compiler or asset kind came from `scope`.
  ///
  /// Returns the number of registrations removed.
  pub fn unregister_all(&self, scope: &ScopeId) -> usize {
    let Ok(mut compilers) = self.compilers.write() else {
      warn!(scope = %scope, "compiler registry poisoned, cannot unregister");
      return 0;
    };

    let mut removed = 0;
    compilers.retain(|kind, by_context| {
      let kind_owned = self.types.origin(kind).as_ref() == Some(scope);
      let before = by_context.len();
      if kind_owned {
        by_context.clear();
      } else {
        by_context.retain(|_, registration| &registration.scope != scope);
      }
      removed += before - by_context.len();
      !by_context.is_empty()
    });
    drop(compilers);

    let kinds = self.types.unregister_scope(scope);
    info!(scope = %scope, compilers = removed, asset_types = kinds.len(), "unregistered scope");
    removed
  }

  /// Queue a module lifecycle event.
  ///
  /// Events without the [`Capability::AssetCompiler`] tag are ignored, as are
  /// loads of a scope that is already loaded and unloads of an unknown scope.
  pub fn notify(&self, event: ModuleEvent) {
    if !event.provides_compilers() {
      return;
    }

    let Ok(mut state) = self.state.lock() else {
      warn!("compiler registry state poisoned, module event dropped");
      return;
    };

    match event {
      ModuleEvent::Loaded { scope, plugin, .. } => {
        if state.registered_scopes.insert(scope.clone()) {
          debug!(scope = %scope, "queued compiler module load");
          state.pending.push(PendingChange::Load(scope, plugin));
        }
      }
      ModuleEvent::Unloaded { scope, .. } => {
        if state.registered_scopes.remove(&scope) {
          debug!(scope = %scope, "queued compiler module unload");
          state.pending.push(PendingChange::Unload(scope));
        }
      }
    }
  }

  /// Scopes currently loaded through [`CompilerRegistry::notify`].
  pub fn registered_scopes(&self) -> Vec<ScopeId> {
    let mut scopes: Vec<ScopeId> = self
      .state
      .lock()
      .map(|state| state.registered_scopes.iter().cloned().collect())
      .unwrap_or_default();
    scopes.sort();
    scopes
  }

  /// Number of `(kind, context)` registrations, pending events excluded.
  pub fn len(&self) -> usize {
    self
      .compilers
      .read()
      .map(|compilers| compilers.values().map(HashMap::len).sum())
      .unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Apply queued module events.
  ///
  /// The queue is drained under the state lock; scanning plugins happens
  /// after that lock is released. The materializing lock spans drain and
  /// apply, so a later batch never overtakes an earlier one.
  fn materialize_pending(&self) -> Result<(), RegistryError> {
    let _materializing = self.materializing.lock().map_err(|_| RegistryError::Poisoned)?;
    let pending = {
      let mut state = self.state.lock().map_err(|_| RegistryError::Poisoned)?;
      std::mem::take(&mut state.pending)
    };

    for change in pending {
      match change {
        PendingChange::Load(scope, plugin) => self.load_plugin(&scope, plugin.as_ref()),
        PendingChange::Unload(scope) => {
          self.unregister_all(&scope);
        }
      }
    }

    Ok(())
  }

  fn load_plugin(&self, scope: &ScopeId, plugin: &dyn CompilerPlugin) {
    for info in plugin.asset_types() {
      let kind = info.kind.clone();
      if let Err(owner) = self.types.claim(info, scope.clone()) {
        warn!(scope = %scope, kind = %kind, owner = %owner, "skipping asset type: already registered by another scope");
      }
    }

    let mut loaded = 0;
    for declaration in plugin.compilers() {
      if !declaration.context.is_legal() {
        warn!(
          scope = %scope,
          kind = %declaration.asset_kind,
          context = %declaration.context,
          "skipping compiler: context is not a compilation context"
        );
        continue;
      }

      let kind = AssetKind(declaration.asset_kind.clone());
      if !self.types.contains(&kind) {
        warn!(scope = %scope, kind = %kind, "skipping compiler: unknown asset kind");
        continue;
      }

      match (declaration.factory)() {
        Ok(compiler) => {
          self.insert(kind, declaration.context, compiler, scope.clone());
          loaded += 1;
        }
        Err(e) => {
          warn!(scope = %scope, kind = %kind, error = %e, "skipping compiler: construction failed");
        }
      }
    }

    info!(scope = %scope, compilers = loaded, "loaded compiler module");
  }
}

#[cfg(test)]
mod tests {
  use tracing_test::traced_test;

  use super::*;
  use crate::asset::AssetItem;
  use crate::compiler::{CompileResult, CompilerContext};
  use crate::context::{ASSET, COMPILATION, CompilationContext, PREVIEW, THUMBNAIL};
  use crate::step::BuildStep;

  static FOREIGN: CompilationContext = CompilationContext::root("foreign");

  struct Named(&'static str);

  impl AssetCompiler for Named {
    fn prepare(&self, _context: &CompilerContext, _item: &AssetItem) -> Result<CompileResult, CompilerError> {
      Ok(CompileResult::with_step(BuildStep::list(self.0)))
    }
  }

  fn named(name: &'static str) -> Arc<dyn AssetCompiler> {
    Arc::new(Named(name))
  }

  /// Identify a compiler by the title of the step it produces.
  fn name_of(compiler: &Arc<dyn AssetCompiler>) -> String {
    let result = compiler
      .prepare(&CompilerContext::default(), &AssetItem::new("x", "x", "x"))
      .unwrap();
    result.steps.step(result.root.unwrap()).title.clone()
  }

  fn types(kinds: &[&str]) -> Arc<AssetTypeRegistry> {
    Arc::new(AssetTypeRegistry::from_infos(kinds.iter().map(|kind| AssetTypeInfo {
      kind: AssetKind::from(*kind),
      always_root: false,
    })))
  }

  struct TestPlugin {
    types: Vec<AssetTypeInfo>,
    declarations: Vec<CompilerDeclaration>,
  }

  impl CompilerPlugin for TestPlugin {
    fn asset_types(&self) -> Vec<AssetTypeInfo> {
      self.types.clone()
    }

    fn compilers(&self) -> Vec<CompilerDeclaration> {
      self.declarations.clone()
    }
  }

  fn loaded(scope: &str, plugin: TestPlugin) -> ModuleEvent {
    ModuleEvent::Loaded {
      scope: ScopeId::from(scope),
      capabilities: vec![Capability::AssetCompiler],
      plugin: Arc::new(plugin),
    }
  }

  fn unloaded(scope: &str) -> ModuleEvent {
    ModuleEvent::Unloaded {
      scope: ScopeId::from(scope),
      capabilities: vec![Capability::AssetCompiler],
    }
  }

  #[test]
  fn exact_lookup_and_overwrite() {
    let registry = CompilerRegistry::new(types(&["Texture"]));
    let kind = AssetKind::from("Texture");

    registry.register(kind.clone(), &ASSET, named("first"));
    registry.register(kind.clone(), &ASSET, named("second"));

    let found = registry.get(&kind, &ASSET).unwrap().unwrap();
    assert_eq!(name_of(&found), "second");
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn lookup_falls_back_to_parent_context() {
    let registry = CompilerRegistry::new(types(&["Texture"]));
    let kind = AssetKind::from("Texture");
    registry.register(kind.clone(), &ASSET, named("asset"));
    registry.register(kind.clone(), &THUMBNAIL, named("thumbnail"));

    assert_eq!(name_of(&registry.get(&kind, &PREVIEW).unwrap().unwrap()), "asset");
    assert_eq!(name_of(&registry.get(&kind, &THUMBNAIL).unwrap().unwrap()), "thumbnail");
    assert!(registry.get(&kind, &COMPILATION).unwrap().is_none());
  }

  #[test]
  fn unrelated_context_uses_default() {
    let registry = CompilerRegistry::new(types(&["Texture"])).with_default(named("default"));
    let kind = AssetKind::from("Texture");
    registry.register(kind.clone(), &PREVIEW, named("preview"));

    assert_eq!(name_of(&registry.get(&kind, &THUMBNAIL).unwrap().unwrap()), "default");
    assert_eq!(
      name_of(&registry.get(&AssetKind::from("Other"), &ASSET).unwrap().unwrap()),
      "default"
    );
  }

  #[test]
  fn plugin_registration_is_deferred_until_lookup() {
    let registry = CompilerRegistry::new(types(&["Texture"]));
    registry.notify(loaded(
      "textures",
      TestPlugin {
        types: vec![],
        declarations: vec![CompilerDeclaration::new("Texture", &ASSET, || Ok(named("plugin")))],
      },
    ));

    assert!(registry.is_empty());
    assert_eq!(registry.registered_scopes(), vec![ScopeId::from("textures")]);

    let found = registry.get(&AssetKind::from("Texture"), &ASSET).unwrap().unwrap();
    assert_eq!(name_of(&found), "plugin");
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn events_without_compiler_capability_are_ignored() {
    let registry = CompilerRegistry::new(types(&["Texture"]));
    registry.notify(ModuleEvent::Loaded {
      scope: ScopeId::from("engine"),
      capabilities: vec![Capability::Engine],
      plugin: Arc::new(TestPlugin {
        types: vec![],
        declarations: vec![CompilerDeclaration::new("Texture", &ASSET, || Ok(named("engine")))],
      }),
    });

    assert!(registry.get(&AssetKind::from("Texture"), &ASSET).unwrap().is_none());
    assert!(registry.registered_scopes().is_empty());
  }

  #[test]
  fn unload_removes_scope_compilers_and_kinds() {
    let registry = CompilerRegistry::new(types(&["Texture"]));
    registry.register(AssetKind::from("Texture"), &ASSET, named("builtin"));
    registry.notify(loaded(
      "nav",
      TestPlugin {
        types: vec![AssetTypeInfo {
          kind: AssetKind::from("NavMesh"),
          always_root: false,
        }],
        declarations: vec![
          CompilerDeclaration::new("NavMesh", &ASSET, || Ok(named("navmesh"))),
          CompilerDeclaration::new("Texture", &PREVIEW, || Ok(named("nav-texture-preview"))),
        ],
      },
    ));

    assert!(registry.get(&AssetKind::from("NavMesh"), &ASSET).unwrap().is_some());
    assert_eq!(registry.len(), 3);

    registry.notify(unloaded("nav"));
    assert!(registry.get(&AssetKind::from("NavMesh"), &ASSET).unwrap().is_none());
    assert!(!registry.asset_types().contains(&AssetKind::from("NavMesh")));

    let texture = registry.get(&AssetKind::from("Texture"), &PREVIEW).unwrap().unwrap();
    assert_eq!(name_of(&texture), "builtin");
    assert_eq!(registry.len(), 1);
  }

  #[test]
  #[traced_test]
  fn redeclared_kind_stays_with_its_owner() {
    let types = Arc::new(AssetTypeRegistry::from_infos([AssetTypeInfo {
      kind: AssetKind::from("Texture"),
      always_root: true,
    }]));
    let registry = CompilerRegistry::new(types);
    registry.register(AssetKind::from("Texture"), &ASSET, named("builtin"));
    registry.notify(loaded(
      "texture-tools",
      TestPlugin {
        types: vec![AssetTypeInfo {
          kind: AssetKind::from("Texture"),
          always_root: false,
        }],
        declarations: vec![CompilerDeclaration::new("Texture", &PREVIEW, || Ok(named("tools-preview")))],
      },
    ));

    let preview = registry.get(&AssetKind::from("Texture"), &PREVIEW).unwrap().unwrap();
    assert_eq!(name_of(&preview), "tools-preview");
    assert!(logs_contain("already registered by another scope"));

    registry.notify(unloaded("texture-tools"));
    let texture = registry.get(&AssetKind::from("Texture"), &PREVIEW).unwrap().unwrap();
    assert_eq!(name_of(&texture), "builtin");
    assert_eq!(registry.len(), 1);
    assert!(registry.asset_types().is_always_root(&AssetKind::from("Texture")));
    assert_eq!(registry.asset_types().origin(&AssetKind::from("Texture")), Some(ScopeId::builtin()));
  }

  #[test]
  fn concurrent_reloads_match_registered_scopes() {
    let registry = CompilerRegistry::new(types(&["Texture"]));
    let plugin = || {
      loaded(
        "hot",
        TestPlugin {
          types: vec![],
          declarations: vec![CompilerDeclaration::new("Texture", &ASSET, || Ok(named("hot")))],
        },
      )
    };

    std::thread::scope(|s| {
      for _ in 0..4 {
        s.spawn(|| {
          for _ in 0..200 {
            registry.notify(plugin());
            registry.get(&AssetKind::from("Texture"), &ASSET).unwrap();
            registry.notify(unloaded("hot"));
            registry.get(&AssetKind::from("Texture"), &ASSET).unwrap();
          }
        });
      }
    });

    let found = registry.get(&AssetKind::from("Texture"), &ASSET).unwrap();
    let is_loaded = registry.registered_scopes().contains(&ScopeId::from("hot"));
    assert_eq!(found.is_some(), is_loaded);
    assert_eq!(registry.len(), usize::from(is_loaded));

    registry.notify(unloaded("hot"));
    assert!(registry.get(&AssetKind::from("Texture"), &ASSET).unwrap().is_none());
    assert!(registry.is_empty());
  }

  #[test]
  fn load_then_unload_in_one_batch_leaves_nothing() {
    let registry = CompilerRegistry::new(types(&["Texture"]));
    registry.notify(loaded(
      "burst",
      TestPlugin {
        types: vec![],
        declarations: vec![CompilerDeclaration::new("Texture", &ASSET, || Ok(named("burst")))],
      },
    ));
    registry.notify(unloaded("burst"));

    assert!(registry.get(&AssetKind::from("Texture"), &ASSET).unwrap().is_none());
    assert!(registry.registered_scopes().is_empty());
  }

  #[test]
  #[traced_test]
  fn malformed_declarations_are_skipped() {
    let registry = CompilerRegistry::new(types(&["Texture"]));
    registry.notify(loaded(
      "broken",
      TestPlugin {
        types: vec![],
        declarations: vec![
          CompilerDeclaration::new("Texture", &FOREIGN, || Ok(named("foreign"))),
          CompilerDeclaration::new("Ghost", &ASSET, || Ok(named("ghost"))),
          CompilerDeclaration::new("Texture", &PREVIEW, || {
            Err(CompilerError::Construction("missing native library".to_string()))
          }),
          CompilerDeclaration::new("Texture", &ASSET, || Ok(named("valid"))),
        ],
      },
    ));

    let found = registry.get(&AssetKind::from("Texture"), &PREVIEW).unwrap().unwrap();
    assert_eq!(name_of(&found), "valid");
    assert_eq!(registry.len(), 1);

    assert!(logs_contain("context is not a compilation context"));
    assert!(logs_contain("unknown asset kind"));
    assert!(logs_contain("construction failed"));
  }
}
