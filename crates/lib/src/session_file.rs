//! JSON session documents.
//!
//! A session document describes packages, asset types and the command
//! compilers to register, so a build graph can be planned without a real
//! asset pipeline:
//!
//! ```json
//! {
//!   "asset_types": [{ "kind": "Scene", "always_root": false }],
//!   "packages": [{
//!     "name": "Game",
//!     "dependencies": ["Core"],
//!     "roots": ["Scenes/Main"],
//!     "assets": [{ "id": "scene", "location": "Scenes/Main", "kind": "Scene", "references": ["tex"] }]
//!   }],
//!   "compilers": [{
//!     "kind": "Scene",
//!     "command": "compile-scene",
//!     "inputs": [{ "kind": "Texture", "dependency": ["compile_content"] }]
//!   }]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::asset::{AssetContent, AssetId, AssetItem, AssetKind, AssetTypeInfo, AssetTypeRegistry, Package, PackageSession};
use crate::compiler::{CommandCompiler, CommandCompilerConfig, CompilerRegistry};
use crate::context::{CompilationContext, ContextRef};

#[derive(Debug, Error)]
pub enum SessionFileError {
  #[error("session file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read session file: {0}")]
  Read(#[source] io::Error),

  #[error("failed to parse session file: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("unknown compilation context: {0}")]
  UnknownContext(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDocument {
  pub id: AssetId,
  pub location: String,
  pub kind: AssetKind,

  #[serde(default)]
  pub references: Vec<AssetId>,

  #[serde(default)]
  pub properties: BTreeMap<String, serde_json::Value>,

  /// Source file, relative to the session document.
  #[serde(default)]
  pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDocument {
  pub name: String,

  #[serde(default)]
  pub dependencies: Vec<String>,

  #[serde(default)]
  pub roots: Vec<String>,

  #[serde(default)]
  pub assets: Vec<AssetDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDocument {
  #[serde(default)]
  pub asset_types: Vec<AssetTypeInfo>,

  #[serde(default)]
  pub packages: Vec<PackageDocument>,

  #[serde(default)]
  pub compilers: Vec<CommandCompilerConfig>,
}

/// A session together with the registry compiling it.
pub struct LoadedSession {
  pub session: PackageSession,
  pub registry: CompilerRegistry,
}

impl LoadedSession {
  pub fn asset_types(&self) -> &AssetTypeRegistry {
    self.registry.asset_types()
  }
}

impl SessionDocument {
  pub fn from_json(content: &str) -> Result<Self, SessionFileError> {
    serde_json::from_str(content).map_err(SessionFileError::Parse)
  }

  /// Build the session and registry described by this document.
  ///
  /// Relative asset sources are resolved against `base_dir`.
  pub fn into_session(self, base_dir: &Path) -> LoadedSession {
    let types = Arc::new(AssetTypeRegistry::from_infos(self.asset_types));
    let registry = CompilerRegistry::new(types);
    for config in self.compilers {
      debug!(kind = %config.kind, context = %config.context, command = %config.command, "registering command compiler");
      registry.register(config.kind.clone(), config.context, Arc::new(CommandCompiler::new(config)));
    }

    let session = PackageSession::from_packages(self.packages.into_iter().map(|doc| {
      let mut package = Package::new(&doc.name);
      package.dependencies = doc.dependencies;
      package.roots = doc.roots;
      for asset in doc.assets {
        let mut item = AssetItem::new(asset.id.0, asset.location, asset.kind.0);
        item.content = AssetContent {
          references: asset.references,
          properties: asset.properties,
        };
        item.source_path = asset.source.map(|source| base_dir.join(source));
        package = package.with_asset(item);
      }
      package
    }));

    LoadedSession { session, registry }
  }
}

/// Read and parse the session document at `path`.
pub fn load(path: &Path) -> Result<LoadedSession, SessionFileError> {
  let content = fs::read_to_string(path).map_err(|e| {
    if e.kind() == io::ErrorKind::NotFound {
      SessionFileError::NotFound(path.to_path_buf())
    } else {
      SessionFileError::Read(e)
    }
  })?;

  let document = SessionDocument::from_json(&content)?;
  let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
  Ok(document.into_session(base_dir))
}

/// Look up a built-in compilation context by name.
pub fn context_by_name(name: &str) -> Result<ContextRef, SessionFileError> {
  CompilationContext::find(name).ok_or_else(|| SessionFileError::UnknownContext(name.to_string()))
}
