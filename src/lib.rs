//! **Identity resolution and inventory joining for Software Bills of Materials (SBOMs).**
//!
//! `sbom-join` reads CycloneDX, SPDX and Syft documents, resolves the dependency
//! references inside each one into a package graph, and joins several such
//! inventories into one de-duplicated inventory keyed by package URL.
//!
//! Inputs come in two evidence classes:
//!
//! - **declaration** documents (built from manifests and lockfiles) are
//!   authoritative; every package they list is kept and same-purl records are
//!   merged
//! - **discovery** documents (scanner output) only contribute packages that no
//!   declaration already accounts for
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: identifiers, package records, the arena [`PackageGraph`] and
//!   the [`Sbom`] inventory.
//! - **[`parsers`]**: format detection and decoders producing package records with
//!   dependency references.
//! - **[`resolve`]**: links dependency references to packages through their
//!   identifiers.
//! - **[`join`]**: the declaration/discovery join.
//! - **[`scan`]**: vulnerability lookup of joined inventories (OSV, feature
//!   `enrichment`).
//! - **[`vex`]**: OpenVEX, CycloneDX VEX and CSAF VEX statements, applied to
//!   scan findings.
//! - **[`pipeline`]**: load → resolve → join → scan → output orchestration.
//!
//! ## Getting Started
//!
//! ```no_run
//! use sbom_join::{join_sboms, parsers::{decode_file, MAX_SBOM_FILE_SIZE}, Sbom};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (_, lockfile) = decode_file(Path::new("app.cdx.json"), MAX_SBOM_FILE_SIZE)?;
//!     let (_, scan) = decode_file(Path::new("image.syft.json"), MAX_SBOM_FILE_SIZE)?;
//!
//!     let (declared, _) = Sbom::from_records("app.cdx.json", &lockfile.records);
//!     let (discovered, _) = Sbom::from_records("image.syft.json", &scan.records);
//!
//!     let joined = join_sboms(&[declared], &[discovered]);
//!     println!("{} packages", joined.sbom.package_count());
//!     Ok(())
//! }
//! ```
//!
//! ### Resolving records directly
//!
//! ```
//! use sbom_join::model::{Identifier, PackageWithDependencyRefs, RawPackage};
//! use sbom_join::resolve;
//!
//! let app = PackageWithDependencyRefs::new(
//!     RawPackage::new("app", "pkg:npm/app@1.0.0").with_identifier(Identifier::bom_ref("app")),
//! )
//! .depends_on(vec![Identifier::bom_ref("lib")]);
//! let lib = PackageWithDependencyRefs::new(
//!     RawPackage::new("lib", "pkg:npm/lib@2.0.0").with_identifier(Identifier::bom_ref("lib")),
//! );
//!
//! let resolution = resolve(&[app, lib]);
//! assert_eq!(resolution.graph.edge_count(), 1);
//! assert_eq!(resolution.roots.len(), 1);
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod join;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod resolve;
pub mod scan;
pub mod vex;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError, JoinConfig, ScanConfig, Validatable};
pub use error::{ErrorContext, OptionContext, Result, SbomError};
pub use join::{join_sboms, join_sboms_with, JoinDiagnostic, JoinOutcome};
pub use model::{
    Identifier, IdentifierType, NodeId, PackageGraph, PackageInfo, PackageWithDependencyRefs,
    Purl, RawPackage, Sbom,
};
pub use parsers::{decode_file, decode_str, DecoderKind, ParseError, SbomDecoder};
pub use resolve::{resolve, Resolution};
#[cfg(feature = "enrichment")]
pub use scan::OsvScanner;
pub use scan::{NoOpScanner, ScanResults, Scanner};
pub use vex::{decode_vex_file, decode_vex_str, VexFormat, VexStatement, VexStatus};
