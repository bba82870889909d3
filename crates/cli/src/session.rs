//! Session and compiler context loading shared by the commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use assetgraph_lib::compiler::CompilerContext;
use assetgraph_lib::session_file::{self, LoadedSession, context_by_name};

use crate::SessionArgs;

/// A loaded session and the package commands start from.
pub struct Selected {
  pub loaded: LoadedSession,
  pub package: String,
}

pub fn load(args: &SessionArgs) -> Result<Selected> {
  let loaded = session_file::load(&args.session)
    .with_context(|| format!("Failed to load session: {}", args.session.display()))?;

  let package = match &args.package {
    Some(name) => name.clone(),
    None => match loaded.session.packages().first() {
      Some(first) => first.name.clone(),
      None => bail!("Session {} has no packages", args.session.display()),
    },
  };

  debug!(package = %package, packages = loaded.session.packages().len(), "session loaded");
  Ok(Selected { loaded, package })
}

/// Build the compiler context from an optional settings file and flag overrides.
pub fn compiler_context(
  config: Option<&Path>,
  context: Option<&str>,
  platform: Option<&str>,
  visit_runtime: bool,
  package: &str,
) -> Result<CompilerContext> {
  let mut settings = match config {
    Some(path) => {
      let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config: {}", path.display()))?;
      serde_json::from_str::<CompilerContext>(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?
    }
    None => CompilerContext::default(),
  };

  if let Some(name) = context {
    settings.compilation = context_by_name(name)?;
  }
  if let Some(platform) = platform {
    settings.platform = platform.to_string();
  }
  if visit_runtime {
    settings.visit_runtime_types = true;
  }
  settings.package = Some(package.to_string());

  Ok(settings)
}
