//! assetgraph-lib: build dependency graphs for asset compilation
//!
//! This crate turns a session of packaged assets into a graph of build steps:
//! - `CompilerRegistry`: resolves the compiler for an asset kind and context
//! - `DependencyGraphBuilder`: walks asset references and links build steps
//! - `ItemListCompiler`: compiles a flat list of items
//! - `AssetEnumerator`: chooses the items a package compilation starts from
//! - `ExecutionPlan`: orders the resulting steps into waves

pub mod asset;
pub mod compiler;
pub mod context;
pub mod graph;
pub mod item_list;
pub mod log;
pub mod package;
pub mod plan;
pub mod roots;
pub mod scope;
pub mod session_file;
pub mod step;
