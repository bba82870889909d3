//! A data-driven compiler that turns every asset into one command.
//!
//! Real per-type compilers live outside this crate. `CommandCompiler` is
//! configured from session documents so graphs can be planned without them:
//!
//! - the asset's source file becomes its input file: the item's source path
//!   when it has one, otherwise its `source` property (a string);
//! - every string in the asset's `errors` property is reported as a
//!   compilation error, which lets sessions exercise the failure policy.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::result::CompileResult;
use super::types::{AssetCompiler, CompilerContext, CompilerError, InputType};
use crate::asset::{AssetItem, AssetKind};
use crate::context::{ASSET, ContextRef};
use crate::graph::DependencyKind;
use crate::log::{LogLevel, LogMessage};
use crate::step::{BuildStep, CommandStep, InputFile};

fn default_context() -> ContextRef {
  &ASSET
}

/// One input declaration of a [`CommandCompilerConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputTypeConfig {
  pub kind: AssetKind,

  #[serde(with = "crate::context::by_name", default = "default_context")]
  pub context: ContextRef,

  pub dependency: DependencyKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandCompilerConfig {
  /// Asset kind the compiler is registered for.
  pub kind: AssetKind,

  /// Context the compiler is registered for.
  #[serde(with = "crate::context::by_name", default = "default_context")]
  pub context: ContextRef,

  /// Name of the command each asset turns into.
  pub command: String,

  #[serde(default)]
  pub inputs: Vec<InputTypeConfig>,

  #[serde(default)]
  pub excluded: Vec<AssetKind>,

  #[serde(default)]
  pub runtime_types: Vec<AssetKind>,

  #[serde(default)]
  pub always_check_runtime_types: bool,
}

impl CommandCompilerConfig {
  pub fn new(kind: &str, command: &str) -> Self {
    Self {
      kind: AssetKind::from(kind),
      context: &ASSET,
      command: command.to_string(),
      inputs: Vec::new(),
      excluded: Vec::new(),
      runtime_types: Vec::new(),
      always_check_runtime_types: false,
    }
  }

  pub fn with_input(mut self, kind: &str, dependency: DependencyKind) -> Self {
    self.inputs.push(InputTypeConfig {
      kind: AssetKind::from(kind),
      context: &ASSET,
      dependency,
    });
    self
  }
}

#[derive(Debug, Clone)]
pub struct CommandCompiler {
  config: CommandCompilerConfig,
}

impl CommandCompiler {
  pub fn new(config: CommandCompilerConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &CommandCompilerConfig {
    &self.config
  }
}

impl AssetCompiler for CommandCompiler {
  fn prepare(&self, context: &CompilerContext, item: &AssetItem) -> Result<CompileResult, CompilerError> {
    let asset = item.to_reference();
    let mut result = CompileResult::with_step(BuildStep::asset_build(asset.clone()));

    if let Some(errors) = item.content.properties.get("errors").and_then(|v| v.as_array()) {
      for error in errors.iter().filter_map(|e| e.as_str()) {
        result
          .log
          .log(LogMessage::new(LogLevel::Error, error).for_asset(asset.clone()));
      }
    }

    let command = BuildStep::command(CommandStep {
      command: self.config.command.clone(),
      parameters: json!({
        "asset": item.id,
        "location": item.location,
        "platform": context.platform,
        "context": context.compilation.name(),
        "properties": item.content.properties,
      }),
      input_files: self.input_files(item),
    });
    let command = result.steps.add(command);
    if let Some(root) = result.root {
      result.steps.add_child(root, command);
    }

    Ok(result)
  }

  fn input_files(&self, item: &AssetItem) -> Vec<InputFile> {
    if let Some(path) = &item.source_path {
      return vec![InputFile::file(&path.to_string_lossy())];
    }
    item
      .content
      .properties
      .get("source")
      .and_then(|v| v.as_str())
      .map(|source| vec![InputFile::file(source)])
      .unwrap_or_default()
  }

  fn input_types(&self, _item: &AssetItem) -> Vec<InputType> {
    self
      .config
      .inputs
      .iter()
      .map(|input| InputType::new(&input.kind.0, input.dependency).in_context(input.context))
      .collect()
  }

  fn excluded_input_types(&self, _item: &AssetItem) -> Vec<AssetKind> {
    self.config.excluded.clone()
  }

  fn always_check_runtime_types(&self) -> bool {
    self.config.always_check_runtime_types
  }

  fn runtime_types(&self, _item: &AssetItem) -> Vec<AssetKind> {
    self.config.runtime_types.clone()
  }
}
