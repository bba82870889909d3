use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::asset::{AssetId, PackageSession};
use crate::log::{CompileLog, LogLevel, LogMessage};

/// Check run on a session before its roots are enumerated.
///
/// Problems go to `log`; any error level message stops enumeration.
pub trait SessionValidator {
  fn validate(&self, session: &PackageSession, package: &str, log: &mut CompileLog);
}

/// Checks that ids, locations and package dependencies are consistent.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralIntegrityCheck;

impl SessionValidator for StructuralIntegrityCheck {
  fn validate(&self, session: &PackageSession, package: &str, log: &mut CompileLog) {
    if session.package(package).is_none() {
      log.error(format!("package {package} is not part of the session"));
    }

    let known_packages: HashSet<&str> = session.packages().iter().map(|p| p.name.as_str()).collect();
    let mut owners: HashMap<&AssetId, &str> = HashMap::new();

    for pkg in session.packages() {
      for dependency in &pkg.dependencies {
        if !known_packages.contains(dependency.as_str()) {
          log.error(format!("package {} depends on missing package {dependency}", pkg.name));
        }
      }

      let mut locations = HashSet::new();
      for item in &pkg.assets {
        if let Some(owner) = owners.insert(&item.id, &pkg.name) {
          log.log(
            LogMessage::new(
              LogLevel::Error,
              format!("asset id {} is used in both {owner} and {}", item.id, pkg.name),
            )
            .for_asset(item.to_reference()),
          );
        }
        if !locations.insert(item.location.as_str()) {
          log.log(
            LogMessage::new(
              LogLevel::Error,
              format!("location {} appears twice in package {}", item.location, pkg.name),
            )
            .for_asset(item.to_reference()),
          );
        }
        for target in &item.content.references {
          if session.find_asset(target).is_none() {
            log.log(
              LogMessage::new(LogLevel::Warning, format!("reference to unknown asset {target}"))
                .for_asset(item.to_reference()),
            );
          }
        }
      }
    }

    debug!(package, errored = log.has_errors(), "validated session");
  }
}
