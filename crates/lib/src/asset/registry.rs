//! Known asset kinds.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::AssetKind;
use crate::scope::ScopeId;

/// Description of a registered asset kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTypeInfo {
  pub kind: AssetKind,

  /// Items of this kind are build roots even when no package marks them.
  #[serde(default)]
  pub always_root: bool,
}

#[derive(Debug, Clone)]
struct Entry {
  info: AssetTypeInfo,
  origin: ScopeId,
}

/// Registry of the asset kinds a session knows about.
///
/// Shared between the compiler registry (to resolve declared kinds) and root
/// selection (to find always-root kinds). Safe to use from several threads.
#[derive(Debug, Default)]
pub struct AssetTypeRegistry {
  types: RwLock<HashMap<AssetKind, Entry>>,
}

impl AssetTypeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a registry from a list of kinds owned by the builtin scope.
  pub fn from_infos(infos: impl IntoIterator<Item = AssetTypeInfo>) -> Self {
    let registry = Self::new();
    for info in infos {
      registry.register(info, ScopeId::builtin());
    }
    registry
  }

  /// Register (or replace) a kind on behalf of `origin`.
  pub fn register(&self, info: AssetTypeInfo, origin: ScopeId) {
    debug!(kind = %info.kind, scope = %origin, always_root = info.always_root, "registering asset type");
    if let Ok(mut types) = self.types.write() {
      types.insert(info.kind.clone(), Entry { info, origin });
    }
  }

  /// Register a kind on behalf of `origin` unless another scope owns it.
  ///
  /// A scope may re-register its own kinds. When the kind belongs to a
  /// different scope nothing changes and that scope is returned.
  pub fn claim(&self, info: AssetTypeInfo, origin: ScopeId) -> Result<(), ScopeId> {
    let Ok(mut types) = self.types.write() else {
      return Ok(());
    };
    if let Some(existing) = types.get(&info.kind)
      && existing.origin != origin
    {
      return Err(existing.origin.clone());
    }
    debug!(kind = %info.kind, scope = %origin, always_root = info.always_root, "claiming asset type");
    types.insert(info.kind.clone(), Entry { info, origin });
    Ok(())
  }

  pub fn contains(&self, kind: &AssetKind) -> bool {
    self.types.read().map(|types| types.contains_key(kind)).unwrap_or(false)
  }

  pub fn get(&self, kind: &AssetKind) -> Option<AssetTypeInfo> {
    self.types.read().ok()?.get(kind).map(|entry| entry.info.clone())
  }

  /// True if items of `kind` are always treated as build roots.
  pub fn is_always_root(&self, kind: &AssetKind) -> bool {
    self.get(kind).is_some_and(|info| info.always_root)
  }

  /// The scope that registered `kind`.
  pub fn origin(&self, kind: &AssetKind) -> Option<ScopeId> {
    self.types.read().ok()?.get(kind).map(|entry| entry.origin.clone())
  }

  /// Remove every kind registered by `scope`, returning the removed kinds.
  pub fn unregister_scope(&self, scope: &ScopeId) -> Vec<AssetKind> {
    let Ok(mut types) = self.types.write() else {
      return Vec::new();
    };
    let removed: Vec<AssetKind> = types
      .iter()
      .filter(|(_, entry)| &entry.origin == scope)
      .map(|(kind, _)| kind.clone())
      .collect();
    for kind in &removed {
      types.remove(kind);
    }
    removed
  }

  pub fn kinds(&self) -> Vec<AssetKind> {
    let mut kinds: Vec<_> = self
      .types
      .read()
      .map(|types| types.keys().cloned().collect())
      .unwrap_or_default();
    kinds.sort();
    kinds
  }
}
