//! Dependency graph construction.
//!
//! - [`DependencyKind`]: why one asset needs another
//! - [`DependencyAnalyzer`]: discovers the references of an item
//! - [`DependencyGraphBuilder`]: walks references and emits build steps

mod analysis;
mod builder;
mod kind;
mod node;

pub use analysis::{AnalysisError, CompilerInputAnalyzer, DependencyAnalyzer};
pub use builder::DependencyGraphBuilder;
pub use kind::DependencyKind;
pub use node::{DependencyNode, NodeKey, NodeStore, Reference, merge_reference};
