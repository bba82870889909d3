//! Dependency analysis: discovering the outgoing references of an item.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, trace};

use crate::asset::{AssetId, AssetItem, AssetKind, PackageSession};
use crate::compiler::{AssetCompiler, CompilerContext};
use crate::context::ASSET;

use super::kind::DependencyKind;
use super::node::{Reference, merge_reference};

#[derive(Debug, Error)]
pub enum AnalysisError {
  #[error("{source_asset} references unknown asset {target}")]
  MissingReference { source_asset: AssetId, target: AssetId },

  #[error("analysis of {asset} failed: {message}")]
  Failed { asset: AssetId, message: String },
}

/// Finds the references of an item in its content graph.
///
/// `compiler` is the compiler resolved for the item in `context.compilation`,
/// if any. Called at most once per node and graph-building call.
pub trait DependencyAnalyzer {
  fn analyze(
    &self,
    item: &AssetItem,
    compiler: Option<&dyn AssetCompiler>,
    context: &CompilerContext,
  ) -> Result<Vec<Reference>, AnalysisError>;
}

impl<F> DependencyAnalyzer for F
where
  F: Fn(&AssetItem, &CompilerContext) -> Result<Vec<Reference>, AnalysisError>,
{
  fn analyze(
    &self,
    item: &AssetItem,
    _compiler: Option<&dyn AssetCompiler>,
    context: &CompilerContext,
  ) -> Result<Vec<Reference>, AnalysisError> {
    self(item, context)
  }
}

/// Classifies an item's content references with the item's own compiler.
///
/// A referenced asset is visited when its kind is listed in the compiler's
/// input types (and not excluded). When runtime types are checked, references
/// to runtime kinds are additionally visited as [`DependencyKind::RUNTIME`]
/// dependencies in the asset context. Items without a compiler have no
/// references.
#[derive(Debug, Clone, Copy)]
pub struct CompilerInputAnalyzer<'a> {
  session: &'a PackageSession,
  strict: bool,
}

impl<'a> CompilerInputAnalyzer<'a> {
  pub fn new(session: &'a PackageSession) -> Self {
    Self { session, strict: false }
  }

  /// Treat references to assets missing from the session as errors.
  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  fn resolve_targets(&self, item: &AssetItem) -> Result<Vec<&'a std::sync::Arc<AssetItem>>, AnalysisError> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for id in &item.content.references {
      if !seen.insert(id) {
        continue;
      }
      match self.session.find_asset(id) {
        Some(target) => targets.push(target),
        None if self.strict => {
          return Err(AnalysisError::MissingReference {
            source_asset: item.id.clone(),
            target: id.clone(),
          });
        }
        None => debug!(asset = %item.id, target = %id, "skipping reference to unknown asset"),
      }
    }
    Ok(targets)
  }
}

impl DependencyAnalyzer for CompilerInputAnalyzer<'_> {
  fn analyze(
    &self,
    item: &AssetItem,
    compiler: Option<&dyn AssetCompiler>,
    context: &CompilerContext,
  ) -> Result<Vec<Reference>, AnalysisError> {
    let Some(compiler) = compiler else {
      return Ok(Vec::new());
    };

    let targets = self.resolve_targets(item)?;
    let inputs = compiler.input_types(item);
    let excluded: HashSet<AssetKind> = compiler.excluded_input_types(item).into_iter().collect();
    let mut references = Vec::new();

    for target in &targets {
      if excluded.contains(&target.kind) {
        continue;
      }
      for input in inputs.iter().filter(|input| input.kind == target.kind) {
        merge_reference(
          &mut references,
          Reference::new((*target).clone(), input.context, input.dependency),
        );
      }
    }

    if compiler.always_check_runtime_types() || context.visit_runtime_types {
      let runtime: HashSet<AssetKind> = compiler.runtime_types(item).into_iter().collect();
      for target in &targets {
        if runtime.contains(&target.kind) && !excluded.contains(&target.kind) {
          merge_reference(
            &mut references,
            Reference::new((*target).clone(), &ASSET, DependencyKind::RUNTIME),
          );
        }
      }
    }

    trace!(asset = %item.id, references = references.len(), "analyzed item");
    Ok(references)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::asset::Package;
  use crate::compiler::{CommandCompiler, CommandCompilerConfig};
  use crate::context::THUMBNAIL;

  fn session() -> PackageSession {
    PackageSession::from_packages([Package::new("Game")
      .with_asset(
        AssetItem::new("scene", "Scenes/Main", "Scene")
          .with_reference("tex")
          .with_reference("mat")
          .with_reference("sound")
          .with_reference("tex"),
      )
      .with_asset(AssetItem::new("tex", "Textures/Stone", "Texture"))
      .with_asset(AssetItem::new("mat", "Materials/Stone", "Material"))
      .with_asset(AssetItem::new("sound", "Audio/Wind", "Sound"))])
  }

  fn scene(session: &PackageSession) -> &AssetItem {
    session.find_asset(&AssetId::from("scene")).unwrap()
  }

  fn kind_of(references: &[Reference], id: &str) -> Option<DependencyKind> {
    references.iter().find(|r| r.target.id.0 == id).map(|r| r.kind)
  }

  #[test]
  fn input_types_select_references() {
    let session = session();
    let compiler = CommandCompiler::new(
      CommandCompilerConfig::new("Scene", "scene")
        .with_input("Texture", DependencyKind::COMPILE_CONTENT)
        .with_input("Material", DependencyKind::COMPILE_ASSET),
    );

    let references = CompilerInputAnalyzer::new(&session)
      .analyze(scene(&session), Some(&compiler), &CompilerContext::default())
      .unwrap();

    assert_eq!(references.len(), 2);
    assert_eq!(kind_of(&references, "tex"), Some(DependencyKind::COMPILE_CONTENT));
    assert_eq!(kind_of(&references, "mat"), Some(DependencyKind::COMPILE_ASSET));
    assert_eq!(kind_of(&references, "sound"), None);
  }

  #[test]
  fn excluded_types_win_over_inputs() {
    let session = session();
    let mut config = CommandCompilerConfig::new("Scene", "scene").with_input("Texture", DependencyKind::RUNTIME);
    config.excluded.push(AssetKind::from("Texture"));
    let compiler = CommandCompiler::new(config);

    let references = CompilerInputAnalyzer::new(&session)
      .analyze(scene(&session), Some(&compiler), &CompilerContext::default())
      .unwrap();

    assert!(references.is_empty());
  }

  #[test]
  fn runtime_types_only_when_requested() {
    let session = session();
    let mut config = CommandCompilerConfig::new("Scene", "scene").with_input("Texture", DependencyKind::COMPILE_CONTENT);
    config.runtime_types = vec![AssetKind::from("Sound"), AssetKind::from("Texture")];
    let compiler = CommandCompiler::new(config);
    let analyzer = CompilerInputAnalyzer::new(&session);

    let plain = analyzer
      .analyze(scene(&session), Some(&compiler), &CompilerContext::default())
      .unwrap();
    assert_eq!(kind_of(&plain, "sound"), None);

    let mut context = CompilerContext::default();
    context.visit_runtime_types = true;
    let with_runtime = analyzer.analyze(scene(&session), Some(&compiler), &context).unwrap();
    assert_eq!(kind_of(&with_runtime, "sound"), Some(DependencyKind::RUNTIME));
    assert_eq!(
      kind_of(&with_runtime, "tex"),
      Some(DependencyKind::COMPILE_CONTENT | DependencyKind::RUNTIME)
    );
  }

  #[test]
  fn input_context_is_kept() {
    let session = session();
    let mut config = CommandCompilerConfig::new("Scene", "scene").with_input("Texture", DependencyKind::COMPILE_ASSET);
    config.inputs[0].context = &THUMBNAIL;
    let compiler = CommandCompiler::new(config);

    let references = CompilerInputAnalyzer::new(&session)
      .analyze(scene(&session), Some(&compiler), &CompilerContext::default())
      .unwrap();

    assert_eq!(references[0].context, &THUMBNAIL);
  }

  #[test]
  fn no_compiler_means_no_references() {
    let session = session();
    let references = CompilerInputAnalyzer::new(&session)
      .analyze(scene(&session), None, &CompilerContext::default())
      .unwrap();
    assert!(references.is_empty());
  }

  #[test]
  fn strict_mode_rejects_missing_targets() {
    let session = PackageSession::from_packages([
      Package::new("Game").with_asset(AssetItem::new("scene", "Scenes/Main", "Scene").with_reference("ghost"))
    ]);
    let compiler = CommandCompiler::new(CommandCompilerConfig::new("Scene", "scene"));
    let item = scene(&session);

    assert!(
      CompilerInputAnalyzer::new(&session)
        .analyze(item, Some(&compiler), &CompilerContext::default())
        .is_ok()
    );

    let err = CompilerInputAnalyzer::new(&session)
      .strict(true)
      .analyze(item, Some(&compiler), &CompilerContext::default())
      .unwrap_err();
    assert!(matches!(err, AnalysisError::MissingReference { .. }));
  }
}
