mod cmd;
mod output;
mod session;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// assetgraph - plan asset builds from a package session
#[derive(Parser)]
#[command(name = "assetgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Session and package selection shared by every command.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
  /// Path to the session document (JSON)
  pub session: PathBuf,

  /// Package to start from (default: first package of the session)
  #[arg(short, long)]
  pub package: Option<String>,

  /// Output format
  #[arg(short = 'o', long, value_enum, default_value = "text")]
  pub output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the step graph of a package and dry-run it
  Plan {
    #[command(flatten)]
    session: SessionArgs,

    /// Compilation context (compilation, asset, editor-game, preview, thumbnail)
    #[arg(short, long)]
    context: Option<String>,

    /// Compiler context settings file (JSON); flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target platform forwarded to compilers
    #[arg(long)]
    platform: Option<String>,

    /// Follow runtime references for every compiler
    #[arg(long)]
    visit_runtime: bool,

    /// Start from every asset of the package closure instead of its roots
    #[arg(long)]
    all: bool,
  },

  /// List the items a package compilation starts from
  Roots {
    #[command(flatten)]
    session: SessionArgs,

    /// List every asset of the package closure instead of its roots
    #[arg(long)]
    all: bool,
  },

  /// Check the structural integrity of a session
  Check {
    #[command(flatten)]
    session: SessionArgs,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Plan {
      session,
      context,
      config,
      platform,
      visit_runtime,
      all,
    } => cmd::cmd_plan(
      &session,
      &cmd::PlanOptions {
        context,
        config,
        platform,
        visit_runtime,
        all,
      },
    ),
    Commands::Roots { session, all } => cmd::cmd_roots(&session, all),
    Commands::Check { session } => cmd::cmd_check(&session),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
