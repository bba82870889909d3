//! Whole-package compilation: root selection followed by graph building.

use std::sync::Arc;

use tracing::{info, warn};

use crate::compiler::{AssetCompiled, CompileResult, CompilerContext, CompilerRegistry};
use crate::graph::{DependencyAnalyzer, DependencyGraphBuilder};
use crate::log::CompileLog;
use crate::roots::AssetEnumerator;

type SharedObserver = Arc<dyn Fn(&AssetCompiled<'_>) + Send + Sync>;

pub struct PackageCompiler<'a> {
  enumerator: Box<dyn AssetEnumerator + 'a>,
  registry: &'a CompilerRegistry,
  analyzer: &'a dyn DependencyAnalyzer,
  observers: Vec<SharedObserver>,
}

impl<'a> PackageCompiler<'a> {
  pub fn new(
    enumerator: impl AssetEnumerator + 'a,
    registry: &'a CompilerRegistry,
    analyzer: &'a dyn DependencyAnalyzer,
  ) -> Self {
    Self {
      enumerator: Box::new(enumerator),
      registry,
      analyzer,
      observers: Vec::new(),
    }
  }

  /// Forwarded to the graph builder of every [`PackageCompiler::prepare`] call.
  pub fn on_asset_compiled<F>(&mut self, observer: F)
  where
    F: Fn(&AssetCompiled<'_>) + Send + Sync + 'static,
  {
    self.observers.push(Arc::new(observer));
  }

  /// Enumerate the roots and build their step graph.
  ///
  /// Root selection problems come first in the returned log. When they
  /// include errors no graph is built.
  pub fn prepare(&self, context: &CompilerContext) -> CompileResult {
    let mut log = CompileLog::new();
    let roots = self.enumerator.enumerate(&mut log);
    if log.has_errors() {
      warn!(errors = log.errors().count(), "root selection failed, nothing to compile");
      return CompileResult {
        log,
        ..CompileResult::new()
      };
    }

    let mut builder = DependencyGraphBuilder::new(self.registry, self.analyzer);
    for observer in &self.observers {
      let observer = observer.clone();
      builder.on_asset_compiled(move |event| observer(event));
    }

    let mut result = builder.prepare(context, roots);
    log.merge(&result.log);
    result.log = log;

    info!(
      steps = result.steps.len(),
      errored = result.has_errors(),
      "package compilation prepared"
    );
    result
  }
}
