use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Opaque, session-stable identity of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl fmt::Display for AssetId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for AssetId {
  fn from(id: &str) -> Self {
    AssetId(id.to_string())
  }
}

/// The content type of an asset (`Texture`, `Scene`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKind(pub String);

impl fmt::Display for AssetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for AssetKind {
  fn from(kind: &str) -> Self {
    AssetKind(kind.to_string())
  }
}

/// Identity plus location of an asset, as used in logs and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetReference {
  pub id: AssetId,
  pub location: String,
}

impl fmt::Display for AssetReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.id, self.location)
  }
}

/// Typed content payload of an asset.
///
/// The core only looks at `references`; `properties` is passed through
/// untouched to compilers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetContent {
  /// Ids of the assets this content refers to.
  #[serde(default)]
  pub references: Vec<AssetId>,

  /// Free-form, compiler-specific data.
  #[serde(default)]
  pub properties: BTreeMap<String, serde_json::Value>,
}

/// A uniquely identified content unit to be compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetItem {
  pub id: AssetId,

  /// Location path inside the owning package (`Textures/Stone`).
  pub location: String,

  pub kind: AssetKind,

  /// Name of the package owning this item.
  pub package: String,

  pub content: AssetContent,

  /// Absolute path of the source file, when the item comes from disk.
  pub source_path: Option<PathBuf>,
}

impl AssetItem {
  pub fn new(id: impl Into<String>, location: impl Into<String>, kind: impl Into<String>) -> Self {
    Self {
      id: AssetId(id.into()),
      location: location.into(),
      kind: AssetKind(kind.into()),
      package: String::new(),
      content: AssetContent::default(),
      source_path: None,
    }
  }

  pub fn with_package(mut self, package: &str) -> Self {
    self.package = package.to_string();
    self
  }

  pub fn with_reference(mut self, target: &str) -> Self {
    self.content.references.push(AssetId(target.to_string()));
    self
  }

  pub fn with_property(mut self, key: &str, value: serde_json::Value) -> Self {
    self.content.properties.insert(key.to_string(), value);
    self
  }

  pub fn to_reference(&self) -> AssetReference {
    AssetReference {
      id: self.id.clone(),
      location: self.location.clone(),
    }
  }

  /// Absolute path used for log attribution.
  ///
  /// Falls back to `package/location` for items that do not come from disk.
  pub fn full_path(&self) -> PathBuf {
    match &self.source_path {
      Some(path) => path.clone(),
      None => PathBuf::from(&self.package).join(&self.location),
    }
  }
}
