//! Plugin scopes.
//!
//! A scope is the identity of a loadable module. Registrations made on behalf
//! of a scope are removed together when the scope is unloaded.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub String);

impl ScopeId {
  /// Scope owning everything registered directly through the public API.
  pub fn builtin() -> Self {
    ScopeId("builtin".to_string())
  }
}

impl fmt::Display for ScopeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ScopeId {
  fn from(id: &str) -> Self {
    ScopeId(id.to_string())
  }
}

/// Capability tags a module declares when it is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
  /// The module provides asset compilers.
  AssetCompiler,
  /// The module provides asset importers.
  AssetImporter,
  /// The module only contributes engine runtime code.
  Engine,
}
