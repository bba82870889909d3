//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output: colored status
//! messages, compile log rendering and JSON output.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use assetgraph_lib::log::{LogLevel, LogMessage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const LINK: &str = "⇢";
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Text of a compile log message, prefixed with its asset when known.
pub fn format_message(message: &LogMessage) -> String {
  match &message.asset {
    Some(asset) => format!("[{}] {}", asset.location, message.text),
    None => message.text.clone(),
  }
}

/// Print warnings and errors of a compile log; lower levels are left to tracing.
pub fn print_messages<'a>(messages: impl IntoIterator<Item = &'a LogMessage>) {
  for message in messages {
    match message.level {
      LogLevel::Warning => print_warning(&format_message(message)),
      level if level.is_error() => print_error(&format_message(message)),
      _ => {}
    }
  }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use assetgraph_lib::asset::AssetItem;

  #[test]
  fn test_format_message() {
    let plain = LogMessage::new(LogLevel::Warning, "root missing");
    assert_eq!(format_message(&plain), "root missing");

    let item = AssetItem::new("t", "Textures/Stone", "Texture");
    let attributed = LogMessage::new(LogLevel::Error, "corrupt").for_asset(item.to_reference());
    assert_eq!(format_message(&attributed), "[Textures/Stone] corrupt");
  }

  #[test]
  fn test_output_format() {
    assert!(OutputFormat::Json.is_json());
    assert!(!OutputFormat::default().is_json());
  }
}
