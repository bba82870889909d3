//! Choosing the items a package compilation starts from.

mod enumerate;
mod validate;

pub use enumerate::{AssetEnumerator, AssetIter, PackageAssetEnumerator, RootPackageAssetEnumerator};
pub use validate::{SessionValidator, StructuralIntegrityCheck};
