//! Package URL type to OSV ecosystem mapping.

use crate::model::Purl;

/// Purl types and the OSV ecosystem each maps to
const ECOSYSTEMS: &[(&str, &str)] = &[
    ("alpine", "Alpine"),
    ("android", "Android"),
    ("apk", "Alpine"),
    ("apt", "Ubuntu"),
    ("bitnami", "Bitnami"),
    ("cargo", "crates.io"),
    ("composer", "Packagist"),
    ("conan", "ConanCenter"),
    ("cran", "CRAN"),
    ("crates.io", "crates.io"),
    ("deb", "Debian"),
    ("debian", "Debian"),
    ("gem", "RubyGems"),
    ("github", "GitHub Actions"),
    ("go", "Go"),
    ("golang", "Go"),
    ("hackage", "Hackage"),
    ("hex", "Hex"),
    ("linux", "Linux"),
    ("maven", "Maven"),
    ("npm", "npm"),
    ("nuget", "NuGet"),
    ("packagist", "Packagist"),
    ("pub", "Pub"),
    ("pypi", "PyPI"),
    ("rpm", "Red Hat"),
    ("rubygems", "RubyGems"),
    ("swid", "Linux"),
    ("swift", "SwiftURL"),
    ("ubuntu", "Ubuntu"),
];

/// OSV ecosystem name for a purl type, if OSV covers it
#[must_use]
pub fn osv_ecosystem(purl_type: &str) -> Option<&'static str> {
    let purl_type = purl_type.to_ascii_lowercase();
    ECOSYSTEMS
        .iter()
        .find(|(ty, _)| *ty == purl_type)
        .map(|&(_, ecosystem)| ecosystem)
}

/// Package name in the form OSV expects for `ecosystem`.
///
/// Maven joins group and artifact with `:`; ecosystems whose namespace is
/// part of the package identity join with `/`; distro namespaces are dropped.
#[must_use]
pub fn osv_package_name(purl: &Purl, ecosystem: &str) -> String {
    match (ecosystem, purl.namespace()) {
        ("Maven", Some(ns)) => format!("{ns}:{}", purl.name()),
        ("npm" | "Go" | "GitHub Actions" | "Packagist" | "SwiftURL" | "Hex", Some(ns)) => {
            format!("{ns}/{}", purl.name())
        }
        _ => purl.name().to_string(),
    }
}

/// De-duplication key of one OSV query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub ecosystem: &'static str,
    pub name: String,
    pub version: String,
}

impl QueryKey {
    /// Key for a purl with a version, or `None` if OSV cannot be queried for it
    #[must_use]
    pub fn for_purl(purl: &Purl, version: &str) -> Option<Self> {
        let ecosystem = osv_ecosystem(purl.ty())?;
        Some(Self {
            ecosystem,
            name: osv_package_name(purl, ecosystem),
            version: version.to_string(),
        })
    }
}
