use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::asset::{AssetId, AssetItem};
use crate::compiler::AssetCompiler;
use crate::context::ContextRef;

use super::kind::DependencyKind;

/// Identity of a dependency node: an asset compiled for a context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
  pub asset: AssetId,
  pub context: ContextRef,
}

impl NodeKey {
  pub fn new(asset: &AssetId, context: ContextRef) -> Self {
    Self {
      asset: asset.clone(),
      context,
    }
  }
}

impl fmt::Display for NodeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.asset, self.context)
  }
}

/// Outgoing edge of a dependency node.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
  pub target: Arc<AssetItem>,
  pub context: ContextRef,
  pub kind: DependencyKind,
}

impl Reference {
  pub fn new(target: Arc<AssetItem>, context: ContextRef, kind: DependencyKind) -> Self {
    Self { target, context, kind }
  }

  pub fn key(&self) -> NodeKey {
    NodeKey::new(&self.target.id, self.context)
  }
}

/// Add `reference` to `references`, merging flags with an existing
/// reference to the same node.
pub fn merge_reference(references: &mut Vec<Reference>, reference: Reference) {
  let key = reference.key();
  match references.iter_mut().find(|existing| existing.key() == key) {
    Some(existing) => existing.kind |= reference.kind,
    None => references.push(reference),
  }
}

/// Per-invocation graph-building state of one `(asset, context)` pair.
pub struct DependencyNode {
  pub key: NodeKey,
  pub item: Arc<AssetItem>,

  /// Outgoing references; only meaningful once `analyzed` is set.
  pub references: Vec<Reference>,
  pub analyzed: bool,

  /// Compiler resolved for the item's kind in this node's context.
  pub compiler: Option<Arc<dyn AssetCompiler>>,
}

impl fmt::Debug for DependencyNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DependencyNode")
      .field("key", &self.key)
      .field("references", &self.references.len())
      .field("analyzed", &self.analyzed)
      .field("has_compiler", &self.compiler.is_some())
      .finish()
  }
}

/// Memo table of dependency nodes, owned by one graph-building call.
#[derive(Debug, Default)]
pub struct NodeStore {
  nodes: HashMap<NodeKey, DependencyNode>,
}

impl NodeStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// The node for `(item, context)`, created on first use.
  pub fn get_or_create(&mut self, item: &Arc<AssetItem>, context: ContextRef) -> &mut DependencyNode {
    let key = NodeKey::new(&item.id, context);
    self.nodes.entry(key.clone()).or_insert_with(|| DependencyNode {
      key,
      item: item.clone(),
      references: Vec::new(),
      analyzed: false,
      compiler: None,
    })
  }

  pub fn get(&self, key: &NodeKey) -> Option<&DependencyNode> {
    self.nodes.get(key)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}
