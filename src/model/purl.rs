//! Canonical package URLs.
//!
//! Parsing is delegated to the `packageurl` crate; the canonical form is its
//! rendering of the parsed value (lower-cased type, sorted qualifiers,
//! percent-encoded components). Two purls denote the same package key iff their
//! canonical strings are equal.

use packageurl::PackageUrl;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A package URL that failed to parse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed PURL '{purl}': {reason}")]
pub struct PurlError {
    /// The offending input
    pub purl: String,
    /// Parser message
    pub reason: String,
}

/// A parsed, canonicalized package URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Purl {
    canonical: String,
    ty: String,
    namespace: Option<String>,
    name: String,
    version: Option<String>,
}

impl Purl {
    /// Parse and canonicalize a package URL.
    pub fn parse(input: &str) -> Result<Self, PurlError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PurlError {
                purl: input.to_string(),
                reason: "empty package URL".to_string(),
            });
        }

        let prepared = lowercase_scheme_and_type(trimmed);
        let parsed = PackageUrl::from_str(&prepared).map_err(|e| PurlError {
            purl: input.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            canonical: parsed.to_string(),
            ty: parsed.ty().to_string(),
            namespace: parsed.namespace().map(str::to_string),
            name: parsed.name().to_string(),
            version: parsed.version().map(str::to_string),
        })
    }

    /// Build the placeholder purl used for packages that carry none.
    ///
    /// SPDX packages without a purl external reference get
    /// `pkg:internal/internal/<name>@<version>`.
    pub fn internal(name: &str, version: Option<&str>) -> Result<Self, PurlError> {
        let mut url = PackageUrl::new("internal", name.trim()).map_err(|e| PurlError {
            purl: name.to_string(),
            reason: e.to_string(),
        })?;
        url.with_namespace("internal");
        if let Some(v) = version.map(str::trim).filter(|v| !v.is_empty()) {
            url.with_version(v);
        }
        Self::parse(&url.to_string())
    }

    /// Canonical string form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Package type (ecosystem), lower-cased
    #[must_use]
    pub fn ty(&self) -> &str {
        &self.ty
    }

    /// Namespace, if any
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Package name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version, if any
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The same package at another version.
    pub fn with_version(&self, version: &str) -> Result<Self, PurlError> {
        let mut url = PackageUrl::from_str(&self.canonical).map_err(|e| PurlError {
            purl: self.canonical.clone(),
            reason: e.to_string(),
        })?;
        url.with_version(version.trim().to_string());
        Self::parse(&url.to_string())
    }

    /// Whether both purls name the same package, ignoring version and qualifiers
    #[must_use]
    pub fn same_package(&self, other: &Self) -> bool {
        self.ty == other.ty && self.namespace == other.namespace && self.name == other.name
    }

    /// Namespace and name joined with `/`, as most registries spell it
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}/{}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// Lower-case the `pkg:` scheme and the type segment before parsing.
fn lowercase_scheme_and_type(input: &str) -> String {
    let Some((scheme, rest)) = input.split_once(':') else {
        return input.to_string();
    };
    let rest = rest.trim_start_matches('/');
    match rest.split_once('/') {
        Some((ty, tail)) => format!("{}:{}/{tail}", scheme.to_lowercase(), ty.to_lowercase()),
        None => format!("{}:{rest}", scheme.to_lowercase()),
    }
}

impl fmt::Display for Purl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for Purl {
    type Err = PurlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Purl {
    type Error = PurlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Purl> for String {
    fn from(purl: Purl) -> Self {
        purl.canonical
    }
}

impl AsRef<str> for Purl {
    fn as_ref(&self) -> &str {
        &self.canonical
    }
}
