//! Arena of build steps.
//!
//! Steps are stored in a petgraph [`DiGraph`]; edges always point from a
//! parent to a child. [`StepEdge::Child`] edges describe composition and
//! [`StepEdge::Link`] edges describe "parent waits for child" ordering.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use thiserror::Error;

use super::types::{BuildStep, StepEdge, StepId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
  /// Linking would make a step wait on itself.
  #[error("linking {child} under {parent} would create a cycle")]
  LinkCycle { parent: StepId, child: StepId },
}

#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
  graph: DiGraph<BuildStep, StepEdge>,
}

impl BuildGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, step: BuildStep) -> StepId {
    StepId(self.graph.add_node(step))
  }

  pub fn len(&self) -> usize {
    self.graph.node_count()
  }

  pub fn is_empty(&self) -> bool {
    self.graph.node_count() == 0
  }

  pub fn step(&self, id: StepId) -> &BuildStep {
    &self.graph[id.0]
  }

  pub fn step_mut(&mut self, id: StepId) -> &mut BuildStep {
    &mut self.graph[id.0]
  }

  pub fn ids(&self) -> impl Iterator<Item = StepId> + '_ {
    self.graph.node_indices().map(StepId)
  }

  /// Make `child` part of `parent`.
  pub fn add_child(&mut self, parent: StepId, child: StepId) {
    if !self.has_edge(parent, child, StepEdge::Child) {
      self.graph.add_edge(parent.0, child.0, StepEdge::Child);
    }
  }

  /// Make `parent` wait for `child`.
  ///
  /// Linking the same pair twice is a no-op. A link that would close a cycle
  /// through existing link or child edges is refused.
  pub fn link(&mut self, parent: StepId, child: StepId) -> Result<(), StepError> {
    if self.has_edge(parent, child, StepEdge::Link) {
      return Ok(());
    }
    if parent == child || has_path_connecting(&self.graph, child.0, parent.0, None) {
      return Err(StepError::LinkCycle { parent, child });
    }
    self.graph.add_edge(parent.0, child.0, StepEdge::Link);
    Ok(())
  }

  fn has_edge(&self, parent: StepId, child: StepId, kind: StepEdge) -> bool {
    self
      .graph
      .edges_connecting(parent.0, child.0)
      .any(|edge| *edge.weight() == kind)
  }

  fn targets(&self, id: StepId, kind: StepEdge) -> Vec<StepId> {
    let mut out: Vec<StepId> = self
      .graph
      .edges_directed(id.0, Direction::Outgoing)
      .filter(|edge| *edge.weight() == kind)
      .map(|edge| StepId(edge.target()))
      .collect();
    out.sort();
    out
  }

  /// Composition children of `id`, ordered by step id.
  pub fn children(&self, id: StepId) -> Vec<StepId> {
    self.targets(id, StepEdge::Child)
  }

  /// Steps `id` waits for.
  pub fn links(&self, id: StepId) -> Vec<StepId> {
    self.targets(id, StepEdge::Link)
  }

  /// `root` and every step reachable from it through child edges.
  pub fn descendants(&self, root: StepId) -> Vec<StepId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
      if !seen.insert(id) {
        continue;
      }
      out.push(id);
      let mut children = self.children(id);
      children.reverse();
      stack.extend(children);
    }
    out
  }

  /// Move every step and edge of `other` into `self`.
  ///
  /// Returns the mapping from ids in `other` to ids in `self`.
  pub fn absorb(&mut self, other: BuildGraph) -> HashMap<StepId, StepId> {
    let (nodes, edges) = other.graph.into_nodes_edges();
    let mut mapping = HashMap::with_capacity(nodes.len());
    for (idx, node) in nodes.into_iter().enumerate() {
      let new_id = self.add(node.weight);
      mapping.insert(StepId(petgraph::graph::NodeIndex::new(idx)), new_id);
    }
    for edge in edges {
      let source = mapping[&StepId(edge.source())];
      let target = mapping[&StepId(edge.target())];
      self.graph.add_edge(source.0, target.0, edge.weight);
    }
    mapping
  }

  pub(crate) fn inner(&self) -> &DiGraph<BuildStep, StepEdge> {
    &self.graph
  }
}
