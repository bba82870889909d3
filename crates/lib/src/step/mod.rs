//! Build steps: the units of work produced by graph building.
//!
//! Building only produces steps; running them is the job of a downstream
//! execution engine. [`crate::plan`] offers a dry run over the result.

mod graph;
mod types;

pub use graph::{BuildGraph, StepError};
pub use types::{BuildStep, CommandStep, InputFile, StepDiagnostics, StepEdge, StepId, StepKind, UrlKind};
