use std::fmt;
use std::path::PathBuf;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::asset::AssetReference;
use crate::log::{CompileLog, LogMessage};

/// Handle to a step inside a [`super::BuildGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub(crate) NodeIndex);

impl StepId {
  pub fn index(self) -> usize {
    self.0.index()
  }
}

impl fmt::Display for StepId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0.index())
  }
}

/// Edge between two steps, always directed parent -> child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepEdge {
  /// The child is part of the parent (composite steps).
  Child,
  /// The parent needs the child's output before it can run.
  Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlKind {
  /// A file on disk.
  File,
  /// Compiled content addressed by its url.
  Content,
}

/// A file a compiler reads while compiling an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFile {
  pub url: String,
  pub kind: UrlKind,
}

impl InputFile {
  pub fn file(url: &str) -> Self {
    Self {
      url: url.to_string(),
      kind: UrlKind::File,
    }
  }

  pub fn content(url: &str) -> Self {
    Self {
      url: url.to_string(),
      kind: UrlKind::Content,
    }
  }
}

/// One command to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandStep {
  pub command: String,

  /// Parameters handed to the command; hashed by the execution engine.
  #[serde(default)]
  pub parameters: serde_json::Value,

  #[serde(default)]
  pub input_files: Vec<InputFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
  /// Composite step whose children run independently.
  List,
  /// All the work needed to build a single asset.
  AssetBuild { asset: AssetReference },
  Command(CommandStep),
  /// Placeholder that replays `messages` and fails when executed.
  Failing { messages: Vec<LogMessage> },
}

impl StepKind {
  pub fn label(&self) -> &'static str {
    match self {
      StepKind::List => "list",
      StepKind::AssetBuild { .. } => "asset",
      StepKind::Command(_) => "command",
      StepKind::Failing { .. } => "failing",
    }
  }
}

/// Where a step came from, for log attribution only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDiagnostics {
  pub package: String,
  pub asset: AssetReference,
  pub full_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildStep {
  pub kind: StepKind,
  pub title: String,

  /// Scheduling hint; lower values were declared first.
  pub priority: Option<u64>,

  pub logger: CompileLog,
  pub diagnostics: Option<StepDiagnostics>,
}

impl BuildStep {
  pub fn new(kind: StepKind, title: impl Into<String>) -> Self {
    Self {
      kind,
      title: title.into(),
      priority: None,
      logger: CompileLog::new(),
      diagnostics: None,
    }
  }

  pub fn list(title: impl Into<String>) -> Self {
    Self::new(StepKind::List, title)
  }

  pub fn asset_build(asset: AssetReference) -> Self {
    let title = format!("Asset build: {}", asset.location);
    Self::new(StepKind::AssetBuild { asset }, title)
  }

  pub fn command(command: CommandStep) -> Self {
    let title = command.command.clone();
    Self::new(StepKind::Command(command), title)
  }

  pub fn failing(title: impl Into<String>, messages: Vec<LogMessage>) -> Self {
    Self::new(StepKind::Failing { messages }, title)
  }

  pub fn is_failing(&self) -> bool {
    matches!(self.kind, StepKind::Failing { .. })
  }

  pub fn is_asset_build(&self) -> bool {
    matches!(self.kind, StepKind::AssetBuild { .. })
  }
}
