//! Implementation of the `assetgraph roots` command.

use anyhow::{Result, bail};
use serde_json::json;

use assetgraph_lib::log::CompileLog;
use assetgraph_lib::roots::{AssetEnumerator, PackageAssetEnumerator, RootPackageAssetEnumerator};

use crate::SessionArgs;
use crate::output::{print_json, print_messages, print_stat, symbols};
use crate::session;

pub fn cmd_roots(args: &SessionArgs, all: bool) -> Result<()> {
  let selected = session::load(args)?;
  let loaded = &selected.loaded;

  let enumerator: Box<dyn AssetEnumerator + '_> = if all {
    Box::new(PackageAssetEnumerator::new(&loaded.session, &selected.package))
  } else {
    Box::new(RootPackageAssetEnumerator::new(
      &loaded.session,
      loaded.asset_types(),
      &selected.package,
    ))
  };

  let mut log = CompileLog::new();
  let items: Vec<_> = enumerator.enumerate(&mut log).collect();

  if args.output.is_json() {
    let list: Vec<_> = items
      .iter()
      .map(|item| json!({ "id": item.id, "location": item.location, "kind": item.kind, "package": item.package }))
      .collect();
    print_json(&json!({ "package": selected.package, "items": list, "messages": log.messages() }))?;
  } else {
    print_messages(log.messages());
    if !log.has_errors() {
      println!("{}:", selected.package);
      for item in &items {
        println!("  {} {} ({}, {})", symbols::INFO, item.location, item.kind, item.package);
      }
      println!();
      print_stat("Items", &items.len().to_string());
    }
  }

  if log.has_errors() {
    bail!("Root selection for package {} failed", selected.package);
  }
  Ok(())
}
