//! Compilation logs.
//!
//! Every compile operation reports through a [`CompileLog`]: a list of
//! messages plus a "has errors" flag. The same type doubles as the logger
//! attached to each build step.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::asset::AssetReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  Debug,
  Verbose,
  Info,
  Warning,
  Error,
  Fatal,
}

impl LogLevel {
  pub fn is_error(self) -> bool {
    self >= LogLevel::Error
  }
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      LogLevel::Debug => "debug",
      LogLevel::Verbose => "verbose",
      LogLevel::Info => "info",
      LogLevel::Warning => "warning",
      LogLevel::Error => "error",
      LogLevel::Fatal => "fatal",
    };
    f.write_str(label)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
  pub level: LogLevel,
  pub text: String,

  /// The asset the message is about, if any.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub asset: Option<AssetReference>,
}

impl LogMessage {
  pub fn new(level: LogLevel, text: impl Into<String>) -> Self {
    Self {
      level,
      text: text.into(),
      asset: None,
    }
  }

  pub fn for_asset(mut self, asset: AssetReference) -> Self {
    self.asset = Some(asset);
    self
  }
}

impl fmt::Display for LogMessage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.asset {
      Some(asset) => write!(f, "{}: [{}] {}", self.level, asset, self.text),
      None => write!(f, "{}: {}", self.level, self.text),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileLog {
  messages: Vec<LogMessage>,
  errored: bool,
}

impl CompileLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn log(&mut self, message: LogMessage) {
    if message.level.is_error() {
      self.errored = true;
    }
    self.messages.push(message);
  }

  pub fn info(&mut self, text: impl Into<String>) {
    self.log(LogMessage::new(LogLevel::Info, text));
  }

  pub fn warning(&mut self, text: impl Into<String>) {
    self.log(LogMessage::new(LogLevel::Warning, text));
  }

  pub fn error(&mut self, text: impl Into<String>) {
    self.log(LogMessage::new(LogLevel::Error, text));
  }

  /// Flag the log as failed without adding a message.
  pub fn mark_errored(&mut self) {
    self.errored = true;
  }

  pub fn has_errors(&self) -> bool {
    self.errored
  }

  pub fn messages(&self) -> &[LogMessage] {
    &self.messages
  }

  pub fn errors(&self) -> impl Iterator<Item = &LogMessage> {
    self.messages.iter().filter(|m| m.level.is_error())
  }

  /// Append every message of `other`, including its error state.
  pub fn merge(&mut self, other: &CompileLog) {
    self.messages.extend(other.messages.iter().cloned());
    self.errored |= other.errored;
  }

  pub fn is_empty(&self) -> bool {
    self.messages.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_messages_set_flag() {
    let mut log = CompileLog::new();
    log.warning("careful");
    assert!(!log.has_errors());

    log.error("broken");
    assert!(log.has_errors());
    assert_eq!(log.errors().count(), 1);
  }

  #[test]
  fn merge_carries_errored_flag() {
    let mut failed = CompileLog::new();
    failed.mark_errored();

    let mut log = CompileLog::new();
    log.info("hello");
    log.merge(&failed);

    assert!(log.has_errors());
    assert_eq!(log.messages().len(), 1);
  }

  #[test]
  fn message_display_includes_asset() {
    let asset = AssetReference {
      id: "t1".into(),
      location: "Textures/Stone".to_string(),
    };
    let msg = LogMessage::new(LogLevel::Error, "bad format").for_asset(asset);
    assert_eq!(msg.to_string(), "error: [t1:Textures/Stone] bad format");
  }
}
