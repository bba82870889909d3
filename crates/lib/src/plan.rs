//! Execution planning for a prepared step graph.
//!
//! A step can run once every child and every linked step has finished.
//! [`ExecutionPlan`] groups steps into waves of mutually independent steps;
//! [`ExecutionPlan::dry_run`] walks the waves without running commands so the
//! outcome of failing steps can be previewed.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::log::LogMessage;
use crate::step::{BuildGraph, StepId, StepKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
  #[error("step graph contains a cycle")]
  CycleDetected,
}

/// Steps grouped into waves; every prerequisite of a step is in an earlier wave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
  waves: Vec<Vec<StepId>>,
  prerequisites: HashMap<StepId, Vec<StepId>>,
}

/// Outcome of [`ExecutionPlan::dry_run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DryRunReport {
  pub succeeded: Vec<StepId>,

  /// Failing steps with the messages they report.
  pub failed: Vec<(StepId, Vec<LogMessage>)>,

  /// Steps not run, with the prerequisite that failed or was skipped.
  pub skipped: Vec<(StepId, StepId)>,
}

impl DryRunReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty() && self.skipped.is_empty()
  }
}

impl ExecutionPlan {
  /// Compute waves with Kahn's algorithm over child and link edges.
  pub fn from_graph(graph: &BuildGraph) -> Result<Self, PlanError> {
    let mut prerequisites: HashMap<StepId, Vec<StepId>> = HashMap::new();
    let mut dependents: HashMap<StepId, Vec<StepId>> = HashMap::new();
    let mut in_degree: HashMap<StepId, usize> = HashMap::new();

    for id in graph.ids() {
      let mut before = graph.children(id);
      before.extend(graph.links(id));
      before.sort();
      before.dedup();
      for &prerequisite in &before {
        dependents.entry(prerequisite).or_default().push(id);
      }
      in_degree.insert(id, before.len());
      prerequisites.insert(id, before);
    }

    let mut waves = Vec::new();
    let mut remaining: HashSet<StepId> = graph.ids().collect();

    while !remaining.is_empty() {
      let mut ready: Vec<StepId> = remaining.iter().filter(|id| in_degree[*id] == 0).copied().collect();
      if ready.is_empty() {
        return Err(PlanError::CycleDetected);
      }
      ready.sort();

      for id in &ready {
        remaining.remove(id);
        for dependent in dependents.get(id).into_iter().flatten() {
          if let Some(degree) = in_degree.get_mut(dependent) {
            *degree = degree.saturating_sub(1);
          }
        }
      }
      waves.push(ready);
    }

    debug!(steps = graph.len(), waves = waves.len(), "computed execution waves");
    Ok(Self { waves, prerequisites })
  }

  pub fn waves(&self) -> &[Vec<StepId>] {
    &self.waves
  }

  pub fn step_count(&self) -> usize {
    self.waves.iter().map(Vec::len).sum()
  }

  /// Steps that must finish before `id` can run.
  pub fn prerequisites(&self, id: StepId) -> &[StepId] {
    self.prerequisites.get(&id).map(Vec::as_slice).unwrap_or_default()
  }

  /// Walk the plan without executing anything.
  ///
  /// Failing steps fail with their recorded messages, every other step
  /// succeeds unless a prerequisite failed or was skipped.
  pub fn dry_run(&self, graph: &BuildGraph) -> DryRunReport {
    let mut report = DryRunReport::default();
    let mut failed: HashSet<StepId> = HashSet::new();

    for (wave_idx, wave) in self.waves.iter().enumerate() {
      debug!(wave = wave_idx, steps = wave.len(), "dry-running wave");

      for &id in wave {
        let step = graph.step(id);
        if let Some(&blocker) = self.prerequisites(id).iter().find(|dep| failed.contains(*dep)) {
          warn!(step = %id, title = %step.title, failed_dep = %blocker, "skipping step due to failed prerequisite");
          report.skipped.push((id, blocker));
          failed.insert(id);
          continue;
        }

        match &step.kind {
          StepKind::Failing { messages } => {
            warn!(step = %id, title = %step.title, "step fails");
            report.failed.push((id, messages.clone()));
            failed.insert(id);
          }
          _ => report.succeeded.push(id),
        }
      }
    }

    info!(
      succeeded = report.succeeded.len(),
      failed = report.failed.len(),
      skipped = report.skipped.len(),
      "dry run complete"
    );
    report
  }
}
