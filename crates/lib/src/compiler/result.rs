use crate::log::CompileLog;
use crate::step::{BuildGraph, BuildStep, StepId};

/// A build-step subtree plus the log of the operation that produced it.
#[derive(Debug, Clone, Default)]
pub struct CompileResult {
  pub steps: BuildGraph,

  /// Root of the subtree, `None` when nothing needs building.
  pub root: Option<StepId>,

  pub log: CompileLog,
}

impl CompileResult {
  /// An empty result with no steps.
  pub fn new() -> Self {
    Self::default()
  }

  /// A result whose root is a single step.
  pub fn with_step(step: BuildStep) -> Self {
    let mut steps = BuildGraph::new();
    let root = steps.add(step);
    Self {
      steps,
      root: Some(root),
      log: CompileLog::new(),
    }
  }

  /// A result rooted at an empty list step, used to aggregate other results.
  pub fn aggregate(title: &str) -> Self {
    Self::with_step(BuildStep::list(title))
  }

  pub fn has_errors(&self) -> bool {
    self.log.has_errors()
  }

  /// Move the steps of `other` into this result and return the new id of
  /// its root. The log of `other` is not merged.
  pub fn absorb_steps(&mut self, other: CompileResult) -> Option<StepId> {
    let root = other.root?;
    let mapping = self.steps.absorb(other.steps);
    mapping.get(&root).copied()
  }

  /// Append `step` under this result's root.
  pub fn add_top_level(&mut self, step: StepId) {
    if let Some(root) = self.root {
      self.steps.add_child(root, step);
    }
  }

  /// Top-level steps, in the order they were produced.
  pub fn top_level(&self) -> Vec<StepId> {
    self.root.map(|root| self.steps.children(root)).unwrap_or_default()
  }
}
