//! Package records: raw decoder output, normalized records, and record merge.

use super::identifiers::{normalize_identifiers, Identifier};
use super::purl::{Purl, PurlError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version strings that mean "version not known".
///
/// Compared after trimming and lower-casing. `"0"` and `"0.0.0"` are real
/// versions and deliberately absent.
pub const UNKNOWN_VERSION_SENTINELS: &[&str] = &[
    "",
    "unknown",
    "none",
    "n/a",
    "na",
    "not applicable",
    "not available",
    "unspecified",
    "undefined",
    "latest",
    "current",
];

/// Returns true if `version` is absent or one of the unknown-version sentinels.
#[must_use]
pub fn is_version_unknown(version: Option<&str>) -> bool {
    is_version_unknown_with(version, &[])
}

/// Like [`is_version_unknown`], with additional caller-supplied sentinels.
#[must_use]
pub fn is_version_unknown_with(version: Option<&str>, extra: &[String]) -> bool {
    let Some(version) = version else {
        return true;
    };
    let v = version.trim().to_lowercase();
    UNKNOWN_VERSION_SENTINELS.contains(&v.as_str())
        || extra.iter().any(|s| s.trim().to_lowercase() == v)
}

// ============================================================================
// Per-format provenance
// ============================================================================

/// CycloneDX component provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycloneDxSource {
    /// Component `bom-ref`
    pub bom_ref: Option<String>,
    /// Component `type` (library, application, ...)
    pub component_type: Option<String>,
    /// Document `specVersion`
    pub spec_version: Option<String>,
}

/// SPDX package provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpdxSource {
    /// Package `SPDXID`
    pub spdx_id: String,
    /// Document `spdxVersion`
    pub spdx_version: Option<String>,
    /// True when the purl was synthesized because the package carried none
    pub synthesized_purl: bool,
}

/// Syft artifact provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyftSource {
    /// Artifact id
    pub artifact_id: String,
    /// Artifact type (python, go-module, deb, ...)
    pub artifact_type: Option<String>,
    /// Cataloger that found the artifact
    pub found_by: Option<String>,
}

/// Format-specific payload attached by the decoder that produced a record.
///
/// Consumers that need format detail go through the checked accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum PackageSource {
    CycloneDx(CycloneDxSource),
    Spdx(SpdxSource),
    Syft(SyftSource),
}

impl PackageSource {
    /// Human-readable format name
    #[must_use]
    pub const fn format(&self) -> &'static str {
        match self {
            Self::CycloneDx(_) => "CycloneDX",
            Self::Spdx(_) => "SPDX",
            Self::Syft(_) => "Syft",
        }
    }

    /// CycloneDX payload, if this record came from a CycloneDX document
    #[must_use]
    pub const fn as_cyclonedx(&self) -> Option<&CycloneDxSource> {
        match self {
            Self::CycloneDx(s) => Some(s),
            _ => None,
        }
    }

    /// SPDX payload, if this record came from an SPDX document
    #[must_use]
    pub const fn as_spdx(&self) -> Option<&SpdxSource> {
        match self {
            Self::Spdx(s) => Some(s),
            _ => None,
        }
    }

    /// Syft payload, if this record came from a Syft document
    #[must_use]
    pub const fn as_syft(&self) -> Option<&SyftSource> {
        match self {
            Self::Syft(s) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// Raw and normalized records
// ============================================================================

/// A package as a decoder reports it, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPackage {
    pub name: String,
    pub version: Option<String>,
    pub purl: String,
    pub identifiers: Vec<Identifier>,
    pub licenses: Vec<String>,
    pub copyright: Vec<String>,
    pub locations: Vec<String>,
    pub source: Option<PackageSource>,
    pub source_path: String,
}

impl RawPackage {
    /// Create a raw record with a name and purl
    #[must_use]
    pub fn new(name: impl Into<String>, purl: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            purl: purl.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: Identifier) -> Self {
        self.identifiers.push(identifier);
        self
    }

    #[must_use]
    pub fn with_license(mut self, license: impl Into<String>) -> Self {
        self.licenses.push(license.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }

    #[must_use]
    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright.push(copyright.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: PackageSource, source_path: impl Into<String>) -> Self {
        self.source = Some(source);
        self.source_path = source_path.into();
        self
    }
}

/// Why a raw record could not be normalized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidPackage {
    #[error("package '{name}' has no package URL")]
    MissingPurl { name: String },

    #[error("package '{name}': {source}")]
    InvalidPurl {
        name: String,
        #[source]
        source: PurlError,
    },
}

/// A normalized package record.
///
/// Built only through [`PackageInfo::from_raw`]: strings are trimmed, an empty
/// version becomes `None`, the purl is canonical, identifiers are normalized
/// and every string set is deduplicated and sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub purl: Purl,
    pub identifiers: Vec<Identifier>,
    pub licenses: Vec<String>,
    pub copyright: Vec<String>,
    pub locations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PackageSource>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub source_path: String,
}

impl PackageInfo {
    /// Normalize a raw record.
    pub fn from_raw(raw: &RawPackage) -> Result<Self, InvalidPackage> {
        let name = raw.name.trim().to_string();
        if raw.purl.trim().is_empty() {
            return Err(InvalidPackage::MissingPurl { name });
        }
        let purl = Purl::parse(&raw.purl).map_err(|source| InvalidPackage::InvalidPurl {
            name: name.clone(),
            source,
        })?;

        Ok(Self {
            name,
            version: raw
                .version
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            purl,
            identifiers: normalize_identifiers(&raw.identifiers),
            licenses: normalize_strings(raw.licenses.iter()),
            copyright: normalize_strings(raw.copyright.iter()),
            locations: normalize_strings(raw.locations.iter()),
            source: raw.source.clone(),
            source_path: raw.source_path.trim().to_string(),
        })
    }

    /// Canonical purl string, the record's join key
    #[must_use]
    pub fn key(&self) -> &str {
        self.purl.as_str()
    }

    /// `name@version`, or `None` without a version
    #[must_use]
    pub fn name_at_version(&self) -> Option<String> {
        self.version
            .as_deref()
            .map(|v| format!("{}@{v}", self.name))
    }

    /// Merge two records describing the same package.
    ///
    /// Returns `None` unless the canonical purl, the name and the version all
    /// match (two absent versions match). Identifiers and string sets are
    /// unioned; provenance is cleared on the result.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Option<Self> {
        if self.purl != other.purl || self.name != other.name || self.version != other.version {
            return None;
        }

        Some(Self {
            name: self.name.clone(),
            version: self.version.clone(),
            purl: self.purl.clone(),
            identifiers: normalize_identifiers(self.identifiers.iter().chain(&other.identifiers)),
            licenses: normalize_strings(self.licenses.iter().chain(&other.licenses)),
            copyright: normalize_strings(self.copyright.iter().chain(&other.copyright)),
            locations: normalize_strings(self.locations.iter().chain(&other.locations)),
            source: None,
            source_path: String::new(),
        })
    }

    /// Drop provenance, as a merge does
    #[must_use]
    pub fn without_provenance(mut self) -> Self {
        self.source = None;
        self.source_path.clear();
        self
    }
}

/// Trim, drop empties, dedupe and sort a string set.
fn normalize_strings<'a, I>(values: I) -> Vec<String>
where
    I: Iterator<Item = &'a String>,
{
    let mut out: Vec<String> = values
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

/// A raw record plus its dependency references.
///
/// Each inner list is a disjunctive group: any one identifier matching a
/// package is enough to make that package the dependency target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageWithDependencyRefs {
    pub package: RawPackage,
    pub dependencies: Vec<Vec<Identifier>>,
}

impl PackageWithDependencyRefs {
    #[must_use]
    pub fn new(package: RawPackage) -> Self {
        Self {
            package,
            dependencies: Vec::new(),
        }
    }

    /// Add one reference group
    #[must_use]
    pub fn depends_on(mut self, group: Vec<Identifier>) -> Self {
        self.dependencies.push(group);
        self
    }
}
