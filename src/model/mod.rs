//! Package data model.
//!
//! Decoders produce [`PackageWithDependencyRefs`] lists of [`RawPackage`]
//! records. Normalization turns each raw record into a [`PackageInfo`], the
//! resolver links them into a [`PackageGraph`], and an [`Sbom`] is the
//! resulting inventory.
//!
//! ```
//! use sbom_join::model::{Identifier, PackageInfo, RawPackage};
//!
//! let raw = RawPackage::new("foo", "pkg:PyPI/foo@1.0")
//!     .with_version("1.0")
//!     .with_identifier(Identifier::bom_ref("foo-ref"));
//! let info = PackageInfo::from_raw(&raw).unwrap();
//! assert_eq!(info.purl.as_str(), "pkg:pypi/foo@1.0");
//! ```

mod graph;
mod identifiers;
mod package;
mod purl;
mod sbom;

pub use graph::{NodeId, Package, PackageGraph};
pub use identifiers::{
    bom_refs, match_key, normalize_identifiers, Identifier, IdentifierType, MatchableId,
};
pub use package::{
    is_version_unknown, is_version_unknown_with, CycloneDxSource, InvalidPackage, PackageInfo,
    PackageSource, PackageWithDependencyRefs, RawPackage, SpdxSource, SyftSource,
    UNKNOWN_VERSION_SENTINELS,
};
pub use purl::{Purl, PurlError};
pub use sbom::Sbom;
