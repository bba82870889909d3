use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::result::CompileResult;
use crate::asset::{AssetId, AssetItem, AssetKind};
use crate::context::{ASSET, ContextRef};
use crate::graph::DependencyKind;
use crate::log::CompileLog;
use crate::step::{InputFile, StepId};

/// Errors a compiler can raise instead of reporting through its log.
#[derive(Debug, Error)]
pub enum CompilerError {
  /// The compiler could not handle the asset.
  #[error("compiler failed on {asset}: {message}")]
  Failed { asset: AssetId, message: String },

  /// The compiler could not be constructed.
  #[error("compiler could not be created: {0}")]
  Construction(String),
}

/// Asset kinds a compiler needs in order to compile an item, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputType {
  pub kind: AssetKind,

  /// Context in which referenced assets of `kind` are compiled.
  pub context: ContextRef,

  pub dependency: DependencyKind,
}

impl InputType {
  pub fn new(kind: &str, dependency: DependencyKind) -> Self {
    Self {
      kind: AssetKind::from(kind),
      context: &ASSET,
      dependency,
    }
  }

  pub fn in_context(mut self, context: ContextRef) -> Self {
    self.context = context;
    self
  }
}

/// A type-specific asset compiler.
///
/// Only [`AssetCompiler::prepare`] is required; the other methods describe
/// the compiler's inputs to dependency analysis and default to "none".
pub trait AssetCompiler: Send + Sync {
  /// Produce the build steps for `item`.
  ///
  /// Problems with the asset itself should be reported through the result's
  /// log; an `Err` is treated as a hard failure of the whole traversal.
  fn prepare(&self, context: &CompilerContext, item: &AssetItem) -> Result<CompileResult, CompilerError>;

  /// Files read while compiling `item`.
  fn input_files(&self, _item: &AssetItem) -> Vec<InputFile> {
    Vec::new()
  }

  /// Referenced asset kinds that must be visited, with their dependency kind.
  fn input_types(&self, _item: &AssetItem) -> Vec<InputType> {
    Vec::new()
  }

  /// Referenced asset kinds that must never be visited.
  fn excluded_input_types(&self, _item: &AssetItem) -> Vec<AssetKind> {
    Vec::new()
  }

  /// Visit runtime types even when the context does not ask for it.
  fn always_check_runtime_types(&self) -> bool {
    false
  }

  /// Referenced asset kinds that are needed at runtime.
  fn runtime_types(&self, _item: &AssetItem) -> Vec<AssetKind> {
    Vec::new()
  }
}

fn default_platform() -> String {
  std::env::consts::OS.to_string()
}

/// Settings of one compilation, handed to every compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerContext {
  /// Why assets are compiled.
  #[serde(with = "crate::context::by_name", default = "default_compilation")]
  pub compilation: ContextRef,

  #[serde(default = "default_platform")]
  pub platform: String,

  /// Package the compilation was started from.
  #[serde(default)]
  pub package: Option<String>,

  /// Follow runtime references for every compiler, not only those that ask.
  #[serde(default)]
  pub visit_runtime_types: bool,

  /// Free-form options forwarded to compilers.
  #[serde(default)]
  pub properties: BTreeMap<String, serde_json::Value>,
}

fn default_compilation() -> ContextRef {
  &ASSET
}

impl Default for CompilerContext {
  fn default() -> Self {
    Self::new(&ASSET)
  }
}

impl CompilerContext {
  pub fn new(compilation: ContextRef) -> Self {
    Self {
      compilation,
      platform: default_platform(),
      package: None,
      visit_runtime_types: false,
      properties: BTreeMap::new(),
    }
  }

  /// A copy of this context compiling for `compilation` instead.
  pub fn for_compilation(&self, compilation: ContextRef) -> Self {
    Self {
      compilation,
      ..self.clone()
    }
  }
}

/// Notification fired once per compiled item.
#[derive(Debug)]
pub struct AssetCompiled<'a> {
  pub item: &'a AssetItem,
  pub context: ContextRef,

  /// Step produced for the item, if it was kept.
  pub step: Option<StepId>,

  pub log: &'a CompileLog,
}

impl AssetCompiled<'_> {
  pub fn has_errors(&self) -> bool {
    self.log.has_errors()
  }
}

/// Callback receiving [`AssetCompiled`] notifications.
pub type CompiledObserver = Box<dyn Fn(&AssetCompiled<'_>) + Send + Sync>;
