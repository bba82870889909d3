//! Implementation of the `assetgraph check` command.

use anyhow::{Result, bail};
use serde_json::json;

use assetgraph_lib::log::CompileLog;
use assetgraph_lib::roots::{SessionValidator, StructuralIntegrityCheck};

use crate::SessionArgs;
use crate::output::{print_json, print_messages, print_success};
use crate::session;

pub fn cmd_check(args: &SessionArgs) -> Result<()> {
  let selected = session::load(args)?;

  let mut log = CompileLog::new();
  StructuralIntegrityCheck.validate(&selected.loaded.session, &selected.package, &mut log);

  if args.output.is_json() {
    print_json(&json!({
      "package": selected.package,
      "ok": !log.has_errors(),
      "messages": log.messages(),
    }))?;
  } else {
    print_messages(log.messages());
  }

  if log.has_errors() {
    bail!(
      "Session check failed with {} error(s)",
      log.errors().count()
    );
  }

  if !args.output.is_json() {
    print_success(&format!("Session is consistent for package {}", selected.package));
  }
  Ok(())
}
