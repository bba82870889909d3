//! Compilation contexts.
//!
//! A compilation context is a type tag describing *why* an asset is being
//! compiled (final build, preview, thumbnail, ...). Contexts form a single
//! rooted hierarchy: every legal context eventually derives from
//! [`COMPILATION`]. Compiler lookups walk this hierarchy from the most
//! specific context towards the root.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A node in the compilation context hierarchy.
///
/// Contexts are declared as `static` items and passed around as
/// [`ContextRef`]. Two contexts are equal when their names are equal.
#[derive(Debug)]
pub struct CompilationContext {
  name: &'static str,
  parent: Option<&'static CompilationContext>,
}

/// Handle to a statically declared compilation context.
pub type ContextRef = &'static CompilationContext;

/// Root of the hierarchy. Compilers registered here apply to every context.
pub static COMPILATION: CompilationContext = CompilationContext::root("compilation");

/// Final asset build.
pub static ASSET: CompilationContext = CompilationContext::derived("asset", &COMPILATION);

/// Assets compiled for the in-editor game view.
pub static EDITOR_GAME: CompilationContext = CompilationContext::derived("editor-game", &ASSET);

/// Assets compiled for an editor preview.
pub static PREVIEW: CompilationContext = CompilationContext::derived("preview", &ASSET);

/// Assets compiled to render a thumbnail.
pub static THUMBNAIL: CompilationContext = CompilationContext::derived("thumbnail", &ASSET);

/// Every built-in context, used to resolve contexts by name.
pub static BUILTIN_CONTEXTS: &[ContextRef] = &[&COMPILATION, &ASSET, &EDITOR_GAME, &PREVIEW, &THUMBNAIL];

impl CompilationContext {
  /// Declare a context with no parent.
  ///
  /// Only [`COMPILATION`] should be a root; any other root context is
  /// rejected by the compiler registry as illegal.
  pub const fn root(name: &'static str) -> Self {
    Self { name, parent: None }
  }

  /// Declare a context inheriting from `parent`.
  pub const fn derived(name: &'static str, parent: &'static CompilationContext) -> Self {
    Self {
      name,
      parent: Some(parent),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  /// The immediate parent context, if any.
  pub fn parent(&self) -> Option<ContextRef> {
    self.parent
  }

  /// Iterate from this context up to the root, starting with `self`.
  pub fn ancestors(&'static self) -> impl Iterator<Item = ContextRef> {
    std::iter::successors(Some(self), |ctx| ctx.parent)
  }

  /// True if `self` is `other` or derives from it.
  pub fn is_a(&'static self, other: ContextRef) -> bool {
    self.ancestors().any(|ctx| ctx == other)
  }

  /// A context is legal when its ancestor chain ends at [`COMPILATION`].
  pub fn is_legal(&'static self) -> bool {
    self.ancestors().last().is_some_and(|root| root == &COMPILATION)
  }

  /// Resolve a built-in context by name.
  pub fn find(name: &str) -> Option<ContextRef> {
    BUILTIN_CONTEXTS.iter().copied().find(|ctx| ctx.name == name)
  }
}

impl PartialEq for CompilationContext {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name
  }
}

impl Eq for CompilationContext {}

impl Hash for CompilationContext {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.name.hash(state);
  }
}

impl fmt::Display for CompilationContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// Serde helpers storing a [`ContextRef`] as its built-in name.
///
/// Use with `#[serde(with = "crate::context::by_name")]`.
pub mod by_name {
  use serde::{Deserialize, Deserializer, Serializer};

  use super::{CompilationContext, ContextRef};

  pub fn serialize<S: Serializer>(context: &ContextRef, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(context.name())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ContextRef, D::Error> {
    let name = String::deserialize(deserializer)?;
    CompilationContext::find(&name)
      .ok_or_else(|| serde::de::Error::custom(format!("unknown compilation context '{}'", name)))
  }
}
