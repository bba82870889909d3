//! Packages and sessions.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use super::types::{AssetId, AssetItem};

/// A package: a named set of assets plus the packages it depends on.
#[derive(Debug, Clone, Default)]
pub struct Package {
  pub name: String,

  /// Names of packages this package depends on.
  pub dependencies: Vec<String>,

  /// Explicit build roots, either asset ids or locations.
  pub roots: Vec<String>,

  pub assets: Vec<Arc<AssetItem>>,
}

impl Package {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      ..Self::default()
    }
  }

  pub fn with_dependency(mut self, name: &str) -> Self {
    self.dependencies.push(name.to_string());
    self
  }

  pub fn with_root(mut self, root: &str) -> Self {
    self.roots.push(root.to_string());
    self
  }

  /// Add an asset, taking ownership of it for this package.
  pub fn with_asset(mut self, mut item: AssetItem) -> Self {
    item.package = self.name.clone();
    self.assets.push(Arc::new(item));
    self
  }

  pub fn find_by_id(&self, id: &AssetId) -> Option<&Arc<AssetItem>> {
    self.assets.iter().find(|item| &item.id == id)
  }

  pub fn find_by_location(&self, location: &str) -> Option<&Arc<AssetItem>> {
    self.assets.iter().find(|item| item.location == location)
  }

  /// Resolve an explicit root entry, by id first and by location second.
  pub fn resolve_root(&self, root: &str) -> Option<&Arc<AssetItem>> {
    self
      .find_by_id(&AssetId(root.to_string()))
      .or_else(|| self.find_by_location(root))
  }
}

/// The set of loaded packages.
#[derive(Debug, Clone, Default)]
pub struct PackageSession {
  packages: Vec<Package>,
  by_name: HashMap<String, usize>,
  by_asset: HashMap<AssetId, Arc<AssetItem>>,
}

impl PackageSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_packages(packages: impl IntoIterator<Item = Package>) -> Self {
    let mut session = Self::new();
    for package in packages {
      session.add_package(package);
    }
    session
  }

  /// Add a package. A later package with the same name replaces the lookup
  /// entry but both stay in [`PackageSession::packages`] so integrity checks
  /// can see the duplicate.
  pub fn add_package(&mut self, package: Package) {
    for item in &package.assets {
      self.by_asset.entry(item.id.clone()).or_insert_with(|| item.clone());
    }
    self.by_name.insert(package.name.clone(), self.packages.len());
    self.packages.push(package);
  }

  pub fn packages(&self) -> &[Package] {
    &self.packages
  }

  pub fn package(&self, name: &str) -> Option<&Package> {
    self.by_name.get(name).map(|&idx| &self.packages[idx])
  }

  /// Find an asset by id anywhere in the session.
  pub fn find_asset(&self, id: &AssetId) -> Option<&Arc<AssetItem>> {
    self.by_asset.get(id)
  }

  pub fn assets(&self) -> impl Iterator<Item = &Arc<AssetItem>> {
    self.packages.iter().flat_map(|package| package.assets.iter())
  }

  /// Packages reachable from `start` through dependencies.
  ///
  /// Breadth-first, `start` first, each package at most once. Dependencies
  /// naming unknown packages are skipped (the integrity check reports them).
  pub fn dependency_closure(&self, start: &str) -> Vec<&Package> {
    let mut closure = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([start]);

    while let Some(name) = queue.pop_front() {
      if !seen.insert(name) {
        continue;
      }
      let Some(package) = self.package(name) else {
        continue;
      };
      closure.push(package);
      queue.extend(package.dependencies.iter().map(String::as_str));
    }

    closure
  }
}
