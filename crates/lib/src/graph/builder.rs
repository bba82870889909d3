//! Reference-graph traversal producing a build-step graph.
//!
//! [`DependencyGraphBuilder::prepare`] walks the reference graph of a set of
//! root items, compiles every node whose incoming dependency needs a
//! compiled result, and links steps so that a step waits for the steps whose
//! compiled content it consumes.
//!
//! # Failure policy
//!
//! A target reached only through [`DependencyKind::RUNTIME`] edges that fails
//! to compile is replaced by a failing step and the traversal continues. Any
//! other failure (a structurally required target with errors, an analysis
//! error, a registry error, a compiler error) is merged into the result log,
//! marks the result errored and stops the traversal. Steps produced before
//! the abort are kept.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::vec;

use tracing::{debug, error, info, warn};

use super::analysis::DependencyAnalyzer;
use super::kind::DependencyKind;
use super::node::{NodeKey, NodeStore, Reference};
use crate::asset::{AssetId, AssetItem};
use crate::compiler::{AssetCompiled, AssetCompiler, CompileResult, CompiledObserver, CompilerContext, CompilerRegistry};
use crate::context::ContextRef;
use crate::log::{CompileLog, LogLevel, LogMessage};
use crate::step::{BuildStep, StepId};

pub struct DependencyGraphBuilder<'a> {
  registry: &'a CompilerRegistry,
  analyzer: &'a dyn DependencyAnalyzer,
  observers: Vec<CompiledObserver>,
}

impl<'a> DependencyGraphBuilder<'a> {
  pub fn new(registry: &'a CompilerRegistry, analyzer: &'a dyn DependencyAnalyzer) -> Self {
    Self {
      registry,
      analyzer,
      observers: Vec::new(),
    }
  }

  /// Call `observer` once for every item the builder hands to a compiler.
  pub fn on_asset_compiled<F>(&mut self, observer: F)
  where
    F: Fn(&AssetCompiled<'_>) + Send + Sync + 'static,
  {
    self.observers.push(Box::new(observer));
  }

  pub fn add_observer(&mut self, observer: CompiledObserver) {
    self.observers.push(observer);
  }

  /// Build the step graph for `roots` compiled in `context`.
  ///
  /// The returned result is rooted at a list step whose children are the
  /// compiled steps, in the order they were produced.
  pub fn prepare<I>(&self, context: &CompilerContext, roots: I) -> CompileResult
  where
    I: IntoIterator<Item = Arc<AssetItem>>,
  {
    let mut traversal = Traversal::new(self, context);
    for root in roots {
      if traversal.visit(root).is_err() {
        break;
      }
    }

    info!(
      context = %context.compilation,
      nodes = traversal.nodes.len(),
      compiled = traversal.compiled.len(),
      errored = traversal.result.has_errors(),
      "prepared dependency graph"
    );
    traversal.result
  }
}

/// Marker for a traversal stopped by a hard failure. The cause is in the log.
#[derive(Debug)]
struct Aborted;

struct Frame {
  item: Arc<AssetItem>,
  context: ContextRef,
  parent: Option<StepId>,
  kind: DependencyKind,

  /// Set once the node has been entered.
  pending: Option<PendingReferences>,
}

struct PendingReferences {
  references: vec::IntoIter<Reference>,
  step: Option<StepId>,
}

impl Frame {
  fn new(item: Arc<AssetItem>, context: ContextRef, parent: Option<StepId>, kind: DependencyKind) -> Self {
    Self {
      item,
      context,
      parent,
      kind,
      pending: None,
    }
  }
}

/// State of one `prepare` call.
struct Traversal<'t, 'a> {
  builder: &'t DependencyGraphBuilder<'a>,
  context: &'t CompilerContext,
  nodes: NodeStore,
  visited: HashSet<NodeKey>,
  compiled: HashMap<AssetId, StepId>,
  result: CompileResult,
}

impl<'t, 'a> Traversal<'t, 'a> {
  fn new(builder: &'t DependencyGraphBuilder<'a>, context: &'t CompilerContext) -> Self {
    Self {
      builder,
      context,
      nodes: NodeStore::new(),
      visited: HashSet::new(),
      compiled: HashMap::new(),
      result: CompileResult::aggregate(&format!("Compile {}", context.compilation)),
    }
  }

  fn visit(&mut self, root: Arc<AssetItem>) -> Result<(), Aborted> {
    let compilation = self.context.compilation;
    let mut stack = vec![Frame::new(root, compilation, None, DependencyKind::RUNTIME)];

    while let Some(mut frame) = stack.pop() {
      match frame.pending.take() {
        None => {
          let key = NodeKey::new(&frame.item.id, frame.context);
          if !self.visited.insert(key) {
            self.link(&frame)?;
            continue;
          }
          let references = self.enter(&frame)?;
          frame.pending = Some(PendingReferences {
            references: references.into_iter(),
            step: self.compiled.get(&frame.item.id).copied(),
          });
          stack.push(frame);
        }
        Some(mut pending) => match pending.references.next() {
          Some(reference) => {
            let child = Frame::new(reference.target, reference.context, pending.step, reference.kind);
            frame.pending = Some(pending);
            stack.push(frame);
            stack.push(child);
          }
          None => self.link(&frame)?,
        },
      }
    }
    Ok(())
  }

  /// Analyze a node on first visit and compile it when its incoming
  /// dependency needs a compiled result. Returns the node's references.
  fn enter(&mut self, frame: &Frame) -> Result<Vec<Reference>, Aborted> {
    let item = &frame.item;
    let compiler = match self.builder.registry.get(&item.kind, frame.context) {
      Ok(compiler) => compiler,
      Err(err) => {
        self.fail(item, format!("cannot resolve compiler for {} in {}: {err}", item.kind, frame.context));
        return Err(Aborted);
      }
    };

    let compiler_context = self.context.for_compilation(frame.context);
    let references = match self.builder.analyzer.analyze(item, compiler.as_deref(), &compiler_context) {
      Ok(references) => references,
      Err(err) => {
        self.fail(item, format!("dependency analysis failed: {err}"));
        return Err(Aborted);
      }
    };
    debug!(asset = %item.id, context = %frame.context, references = references.len(), "entered node");

    let node = self.nodes.get_or_create(item, frame.context);
    node.references = references.clone();
    node.analyzed = true;
    node.compiler = compiler.clone();

    if frame.kind.requires_compilation() && !self.compiled.contains_key(&item.id) {
      match compiler {
        Some(compiler) => self.compile(frame, compiler.as_ref(), &compiler_context)?,
        None => debug!(asset = %item.id, kind = %item.kind, context = %frame.context, "no compiler, nothing to build"),
      }
    }
    Ok(references)
  }

  fn compile(
    &mut self,
    frame: &Frame,
    compiler: &dyn AssetCompiler,
    compiler_context: &CompilerContext,
  ) -> Result<(), Aborted> {
    let item = &frame.item;
    let prepared = match compiler.prepare(compiler_context, item) {
      Ok(prepared) => prepared,
      Err(err) => {
        let mut log = CompileLog::new();
        log.log(LogMessage::new(LogLevel::Error, err.to_string()).for_asset(item.to_reference()));
        error!(asset = %item.id, error = %err, "compiler failed");
        self.result.log.merge(&log);
        self.notify(item, frame.context, None, &log);
        return Err(Aborted);
      }
    };

    if prepared.has_errors() {
      let log = prepared.log;
      if frame.kind.tolerates_failure() {
        warn!(asset = %item.id, "runtime dependency failed to compile, deferring failure to execution");
        let mut step = BuildStep::failing(format!("Failed: {}", item.location), log.messages().to_vec());
        step.logger = log.clone();
        let id = self.result.steps.add(step);
        self.keep(item, id);
        self.result.log.log(
          LogMessage::new(
            LogLevel::Warning,
            format!("{} failed to compile and will fail when executed", item.location),
          )
          .for_asset(item.to_reference()),
        );
        self.notify(item, frame.context, Some(id), &log);
        return Ok(());
      }

      error!(asset = %item.id, dependency = %frame.kind, "required dependency failed to compile");
      self.result.log.merge(&log);
      self.result.log.mark_errored();
      self.notify(item, frame.context, None, &log);
      return Err(Aborted);
    }

    let log = prepared.log.clone();
    self.result.log.merge(&log);
    let step = self.result.absorb_steps(prepared);
    if let Some(id) = step {
      self.keep(item, id);
    }
    self.notify(item, frame.context, step, &log);
    Ok(())
  }

  fn keep(&mut self, item: &AssetItem, step: StepId) {
    self.result.add_top_level(step);
    self.compiled.insert(item.id.clone(), step);
  }

  /// Make the parent step wait for this node's step when the edge consumes
  /// compiled content.
  fn link(&mut self, frame: &Frame) -> Result<(), Aborted> {
    let Some(parent) = frame.parent else {
      return Ok(());
    };
    if !frame.kind.requires_link() {
      return Ok(());
    }
    let Some(step) = self.compiled.get(&frame.item.id).copied() else {
      return Ok(());
    };
    // An item consuming its own output in another context shares one step.
    if step == parent {
      debug!(asset = %frame.item.id, "skipping link of a step to itself");
      return Ok(());
    }

    if let Err(err) = self.result.steps.link(parent, step) {
      self.fail(&frame.item, format!("circular content dependency: {err}"));
      return Err(Aborted);
    }
    Ok(())
  }

  fn fail(&mut self, item: &AssetItem, text: String) {
    error!(asset = %item.id, "{text}");
    self
      .result
      .log
      .log(LogMessage::new(LogLevel::Error, text).for_asset(item.to_reference()));
  }

  fn notify(&self, item: &AssetItem, context: ContextRef, step: Option<StepId>, log: &CompileLog) {
    let event = AssetCompiled {
      item,
      context,
      step,
      log,
    };
    for observer in &self.builder.observers {
      observer(&event);
    }
  }
}
