use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Bit-flags describing why a source needs the target of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DependencyKind(u8);

impl DependencyKind {
  pub const NONE: DependencyKind = DependencyKind(0);

  /// The target must exist and compile for runtime, but its failure does not
  /// block the source.
  pub const RUNTIME: DependencyKind = DependencyKind(1 << 0);

  /// The target is needed to analyze or compile the source; never embedded.
  pub const COMPILE_ASSET: DependencyKind = DependencyKind(1 << 1);

  /// The target's compiled output is loaded by the source; the source's step
  /// must run after the target's step.
  pub const COMPILE_CONTENT: DependencyKind = DependencyKind(1 << 2);

  const ALL: [(DependencyKind, &'static str); 3] = [
    (Self::RUNTIME, "runtime"),
    (Self::COMPILE_ASSET, "compile_asset"),
    (Self::COMPILE_CONTENT, "compile_content"),
  ];

  pub fn is_empty(self) -> bool {
    self.0 == 0
  }

  /// All flags of `other` are set in `self`.
  pub fn contains(self, other: DependencyKind) -> bool {
    self.0 & other.0 == other.0
  }

  /// At least one flag of `other` is set in `self`.
  pub fn intersects(self, other: DependencyKind) -> bool {
    self.0 & other.0 != 0
  }

  /// True when [`DependencyKind::RUNTIME`] or [`DependencyKind::COMPILE_CONTENT`]
  /// is set.
  ///
  /// Purely structural dependencies are analyzed but never get their own
  /// build step.
  pub fn requires_compilation(self) -> bool {
    self.intersects(Self::RUNTIME | Self::COMPILE_CONTENT)
  }

  /// Failures of a target reached this way are deferred to execution time.
  pub fn tolerates_failure(self) -> bool {
    self == Self::RUNTIME
  }

  /// The source's step waits for the target's step.
  pub fn requires_link(self) -> bool {
    self.contains(Self::COMPILE_CONTENT)
  }

  /// Names of the flags that are set.
  pub fn names(self) -> Vec<&'static str> {
    Self::ALL
      .iter()
      .filter(|(flag, _)| self.contains(*flag))
      .map(|(_, name)| *name)
      .collect()
  }

  /// Parse a single flag name as used in session documents.
  pub fn from_name(name: &str) -> Option<DependencyKind> {
    Self::ALL.iter().find(|(_, n)| *n == name).map(|(flag, _)| *flag)
  }
}

impl BitOr for DependencyKind {
  type Output = DependencyKind;

  fn bitor(self, rhs: DependencyKind) -> DependencyKind {
    DependencyKind(self.0 | rhs.0)
  }
}

impl BitOrAssign for DependencyKind {
  fn bitor_assign(&mut self, rhs: DependencyKind) {
    self.0 |= rhs.0;
  }
}

impl fmt::Display for DependencyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_empty() {
      return f.write_str("none");
    }
    f.write_str(&self.names().join("|"))
  }
}

impl Serialize for DependencyKind {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    self.names().serialize(serializer)
  }
}

impl<'de> Deserialize<'de> for DependencyKind {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let names = Vec::<String>::deserialize(deserializer)?;
    if names.is_empty() {
      return Err(serde::de::Error::custom("dependency kind needs at least one flag"));
    }
    let mut kind = DependencyKind::NONE;
    for name in names {
      kind |= DependencyKind::from_name(&name)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown dependency kind '{}'", name)))?;
    }
    Ok(kind)
  }
}
