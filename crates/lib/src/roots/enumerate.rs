use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use super::validate::{SessionValidator, StructuralIntegrityCheck};
use crate::asset::{AssetItem, AssetTypeRegistry, PackageSession};
use crate::log::{CompileLog, LogLevel, LogMessage};

/// Boxed lazy sequence of items produced by an [`AssetEnumerator`].
pub type AssetIter<'s> = Box<dyn Iterator<Item = Arc<AssetItem>> + 's>;

/// Chooses the items a compilation starts from.
///
/// Problems found while choosing are written to `log`. When it contains
/// errors the returned sequence is empty.
pub trait AssetEnumerator {
  fn enumerate<'s>(&'s self, log: &mut CompileLog) -> AssetIter<'s>;
}

/// Run `validator` and report whether enumeration may proceed.
fn check(validator: &dyn SessionValidator, session: &PackageSession, package: &str, log: &mut CompileLog) -> bool {
  let mut found = CompileLog::new();
  validator.validate(session, package, &mut found);
  log.merge(&found);
  !found.has_errors()
}

/// Every item of the starting package and of all packages it depends on.
pub struct PackageAssetEnumerator<'a> {
  session: &'a PackageSession,
  package: String,
  validator: Box<dyn SessionValidator + 'a>,
}

impl<'a> PackageAssetEnumerator<'a> {
  pub fn new(session: &'a PackageSession, package: &str) -> Self {
    Self {
      session,
      package: package.to_string(),
      validator: Box::new(StructuralIntegrityCheck),
    }
  }

  pub fn with_validator(mut self, validator: impl SessionValidator + 'a) -> Self {
    self.validator = Box::new(validator);
    self
  }
}

impl AssetEnumerator for PackageAssetEnumerator<'_> {
  fn enumerate<'s>(&'s self, log: &mut CompileLog) -> AssetIter<'s> {
    if !check(self.validator.as_ref(), self.session, &self.package, log) {
      return Box::new(std::iter::empty());
    }
    Box::new(
      self
        .session
        .dependency_closure(&self.package)
        .into_iter()
        .flat_map(|package| package.assets.iter().cloned()),
    )
  }
}

/// Only the items that are build roots: explicit package roots across the
/// dependency closure plus every item of an always-root kind.
pub struct RootPackageAssetEnumerator<'a> {
  session: &'a PackageSession,
  types: &'a AssetTypeRegistry,
  package: String,
  validator: Box<dyn SessionValidator + 'a>,
}

impl<'a> RootPackageAssetEnumerator<'a> {
  pub fn new(session: &'a PackageSession, types: &'a AssetTypeRegistry, package: &str) -> Self {
    Self {
      session,
      types,
      package: package.to_string(),
      validator: Box::new(StructuralIntegrityCheck),
    }
  }

  pub fn with_validator(mut self, validator: impl SessionValidator + 'a) -> Self {
    self.validator = Box::new(validator);
    self
  }
}

impl AssetEnumerator for RootPackageAssetEnumerator<'_> {
  fn enumerate<'s>(&'s self, log: &mut CompileLog) -> AssetIter<'s> {
    if !check(self.validator.as_ref(), self.session, &self.package, log) {
      return Box::new(std::iter::empty());
    }

    let closure = self.session.dependency_closure(&self.package);

    // Explicit roots are resolved up front so unresolved ones reach the log.
    let mut explicit = Vec::new();
    for package in &closure {
      for root in &package.roots {
        match package.resolve_root(root) {
          Some(item) => explicit.push(item.clone()),
          None => {
            warn!(package = %package.name, root = %root, "unresolved root");
            log.log(LogMessage::new(
              LogLevel::Warning,
              format!("root {root} of package {} does not match any asset", package.name),
            ));
          }
        }
      }
    }

    let types = self.types;
    let always_root = closure
      .into_iter()
      .flat_map(|package| package.assets.iter())
      .filter(move |item| types.is_always_root(&item.kind))
      .cloned();

    let mut seen = HashSet::new();
    Box::new(
      explicit
        .into_iter()
        .chain(always_root)
        .filter(move |item| seen.insert(item.id.clone())),
    )
  }
}
