//! Implementation of the `assetgraph plan` command.
//!
//! Compiles a package into a step graph, groups the steps into execution
//! waves and dry-runs them so failing steps show up before anything runs.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use owo_colors::{OwoColorize, Stream};
use serde_json::json;

use assetgraph_lib::compiler::CompileResult;
use assetgraph_lib::graph::CompilerInputAnalyzer;
use assetgraph_lib::package::PackageCompiler;
use assetgraph_lib::plan::{DryRunReport, ExecutionPlan};
use assetgraph_lib::roots::{PackageAssetEnumerator, RootPackageAssetEnumerator};
use assetgraph_lib::step::StepId;

use crate::SessionArgs;
use crate::output::{
  format_message, print_info, print_json, print_messages, print_stat, print_success, print_warning, symbols,
};
use crate::session;

#[derive(Debug, Default)]
pub struct PlanOptions {
  pub context: Option<String>,
  pub config: Option<PathBuf>,
  pub platform: Option<String>,
  pub visit_runtime: bool,
  pub all: bool,
}

pub fn cmd_plan(args: &SessionArgs, options: &PlanOptions) -> Result<()> {
  let selected = session::load(args)?;
  let settings = session::compiler_context(
    options.config.as_deref(),
    options.context.as_deref(),
    options.platform.as_deref(),
    options.visit_runtime,
    &selected.package,
  )?;

  let loaded = &selected.loaded;
  let analyzer = CompilerInputAnalyzer::new(&loaded.session);
  let compiler = if options.all {
    PackageCompiler::new(
      PackageAssetEnumerator::new(&loaded.session, &selected.package),
      &loaded.registry,
      &analyzer,
    )
  } else {
    PackageCompiler::new(
      RootPackageAssetEnumerator::new(&loaded.session, loaded.asset_types(), &selected.package),
      &loaded.registry,
      &analyzer,
    )
  };

  let result = compiler.prepare(&settings);
  if result.has_errors() {
    if args.output.is_json() {
      print_json(&json!({ "package": selected.package, "errored": true, "messages": result.log.messages() }))?;
    } else {
      print_messages(result.log.messages());
    }
    bail!("Compilation of package {} failed", selected.package);
  }

  let plan = ExecutionPlan::from_graph(&result.steps).context("Failed to order build steps")?;
  let report = plan.dry_run(&result.steps);

  if args.output.is_json() {
    print_json(&plan_json(&selected.package, settings.compilation.name(), &result, &plan, &report))?;
    return Ok(());
  }

  print_success(&format!(
    "Planned {} ({})",
    selected.package,
    settings.compilation.name()
  ));
  print_stat("Steps", &plan.step_count().to_string());
  print_stat("Waves", &plan.waves().len().to_string());
  println!();

  for (index, wave) in plan.waves().iter().enumerate() {
    println!("Wave {}:", index + 1);
    for &id in wave {
      print_step(&result, id);
    }
  }

  print_messages(result.log.messages());

  println!();
  if report.is_success() {
    print_success(&format!("Dry run: {} step(s) would succeed", report.succeeded.len()));
  } else {
    print_warning(&format!(
      "Dry run: {} succeeded, {} failed, {} skipped",
      report.succeeded.len(),
      report.failed.len(),
      report.skipped.len()
    ));
    for (id, messages) in &report.failed {
      print_info(&format!("{} {}", id, result.steps.step(*id).title));
      for message in messages {
        println!("    {}", format_message(message));
      }
    }
  }

  Ok(())
}

fn print_step(result: &CompileResult, id: StepId) {
  let step = result.steps.step(id);
  println!(
    "  {} {} {} {}",
    symbols::ARROW,
    id.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    step.kind.label().if_supports_color(Stream::Stdout, |s| s.cyan()),
    step.title
  );
  for linked in result.steps.links(id) {
    println!("      {} {}", symbols::LINK, result.steps.step(linked).title);
  }
}

fn plan_json(
  package: &str,
  context: &str,
  result: &CompileResult,
  plan: &ExecutionPlan,
  report: &DryRunReport,
) -> serde_json::Value {
  let steps: Vec<_> = result
    .steps
    .ids()
    .map(|id| {
      let step = result.steps.step(id);
      json!({
        "id": id.index(),
        "kind": step.kind.label(),
        "title": step.title,
        "priority": step.priority,
        "children": result.steps.children(id).iter().map(|c| c.index()).collect::<Vec<_>>(),
        "links": result.steps.links(id).iter().map(|l| l.index()).collect::<Vec<_>>(),
      })
    })
    .collect();
  let waves: Vec<Vec<usize>> = plan
    .waves()
    .iter()
    .map(|wave| wave.iter().map(|id| id.index()).collect())
    .collect();

  json!({
    "package": package,
    "context": context,
    "errored": false,
    "steps": steps,
    "waves": waves,
    "messages": result.log.messages(),
    "dry_run": {
      "succeeded": report.succeeded.iter().map(|id| id.index()).collect::<Vec<_>>(),
      "failed": report.failed.iter().map(|(id, messages)| json!({ "id": id.index(), "messages": messages })).collect::<Vec<_>>(),
      "skipped": report.skipped.iter().map(|(id, blocker)| json!({ "id": id.index(), "blocked_by": blocker.index() })).collect::<Vec<_>>(),
    },
  })
}
