//! Assets, packages and the session that holds them.
//!
//! Loading these from real project files is not the concern of this crate;
//! see [`crate::session_file`] for the JSON document used by the CLI.

mod package;
mod registry;
mod types;

pub use package::{Package, PackageSession};
pub use registry::{AssetTypeInfo, AssetTypeRegistry};
pub use types::{AssetContent, AssetId, AssetItem, AssetKind, AssetReference};
