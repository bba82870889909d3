//! Compiling a flat list of items without following references.

use std::borrow::Borrow;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error};

use crate::asset::AssetItem;
use crate::compiler::{AssetCompiled, CompileResult, CompiledObserver, CompilerContext, CompilerRegistry};
use crate::context::ContextRef;
use crate::log::{LogLevel, LogMessage};
use crate::step::{BuildStep, StepDiagnostics, StepId};

static PRIORITY: AtomicU64 = AtomicU64::new(0);

/// Next value of the process-wide step priority counter.
pub fn next_priority() -> u64 {
  PRIORITY.fetch_add(1, Ordering::Relaxed)
}

/// Compiles items one by one in a fixed compilation context.
pub struct ItemListCompiler<'a> {
  registry: &'a CompilerRegistry,
  context: ContextRef,
  observers: Vec<CompiledObserver>,
}

impl<'a> ItemListCompiler<'a> {
  pub fn new(registry: &'a CompilerRegistry, context: ContextRef) -> Self {
    Self {
      registry,
      context,
      observers: Vec::new(),
    }
  }

  pub fn on_asset_compiled<F>(&mut self, observer: F)
  where
    F: Fn(&AssetCompiled<'_>) + Send + Sync + 'static,
  {
    self.observers.push(Box::new(observer));
  }

  /// Compile every item into `result`. Failures are logged and the next item
  /// is compiled regardless.
  pub fn compile<I>(&self, context: &CompilerContext, items: I, result: &mut CompileResult)
  where
    I: IntoIterator,
    I::Item: Borrow<AssetItem>,
  {
    for item in items {
      self.compile_one(context, result, item.borrow());
    }
  }

  /// Compile one item and append its step under the root of `result`.
  pub fn compile_one(&self, context: &CompilerContext, result: &mut CompileResult, item: &AssetItem) -> Option<StepId> {
    let compiler = match self.registry.get(&item.kind, self.context) {
      Ok(Some(compiler)) => compiler,
      Ok(None) => {
        debug!(asset = %item.id, kind = %item.kind, context = %self.context, "no compiler, skipping item");
        return None;
      }
      Err(err) => {
        error!(asset = %item.id, error = %err, "compiler lookup failed");
        result.log.log(
          LogMessage::new(LogLevel::Error, format!("cannot resolve compiler for {}: {err}", item.kind))
            .for_asset(item.to_reference()),
        );
        return None;
      }
    };

    let compiler_context = context.for_compilation(self.context);
    let mut prepared = match compiler.prepare(&compiler_context, item) {
      Ok(prepared) => prepared,
      Err(err) => {
        error!(asset = %item.id, error = %err, "compiler failed");
        result
          .log
          .log(LogMessage::new(LogLevel::Error, err.to_string()).for_asset(item.to_reference()));
        return None;
      }
    };

    let log = prepared.log.clone();
    if log.has_errors()
      && let Some(root) = prepared.root
      && prepared.steps.step(root).is_asset_build()
    {
      let failing = BuildStep::failing(format!("Failed: {}", item.location), log.errors().cloned().collect());
      let failing = prepared.steps.add(failing);
      prepared.steps.add_child(root, failing);
    }

    let diagnostics = StepDiagnostics {
      package: item.package.clone(),
      asset: item.to_reference(),
      full_path: item.full_path(),
    };
    let ids: Vec<StepId> = prepared.steps.ids().collect();
    for id in ids {
      prepared.steps.step_mut(id).diagnostics = Some(diagnostics.clone());
    }
    if let Some(root) = prepared.root {
      prepared.steps.step_mut(root).logger.merge(&log);
    }

    result.log.merge(&log);
    let step = result.absorb_steps(prepared);
    if let Some(id) = step {
      result.steps.step_mut(id).priority = Some(next_priority());
      result.add_top_level(id);
    }

    let event = AssetCompiled {
      item,
      context: self.context,
      step,
      log: &log,
    };
    for observer in &self.observers {
      observer(&event);
    }
    step
  }
}
