//! Package identifiers and identifier-set matching.
//!
//! SBOM producers describe the same package with different, partially
//! overlapping identifier sets. A CycloneDX generator may emit a `bom-ref`
//! and a purl, an image scanner a layer digest and a CPE. This module provides:
//!
//! 1. [`Identifier`] - a `(type, value)` pair with an open-ended [`IdentifierType`]
//! 2. [`normalize_identifiers`] - canonical, sorted, deduplicated identifier lists
//! 3. [`MatchableId`] - a keyed identifier set supporting subset-consistency checks
//!
//! Two sets are *equal* when their match keys are equal. A set is a
//! *consistent subset* of another when every type it carries is carried by the
//! other with the same value; types present only on the other side are ignored.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier type tag.
///
/// The set of tags is open: new ecosystems introduce new identifier kinds, so
/// any string is accepted. The well-known tags are available as constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentifierType(Cow<'static, str>);

impl IdentifierType {
    /// Common Platform Enumeration
    pub const CPE: Self = Self(Cow::Borrowed("cpe"));
    /// Package URL
    pub const PURL: Self = Self(Cow::Borrowed("purl"));
    /// SHA-1 content digest
    pub const SHA1: Self = Self(Cow::Borrowed("sha-1"));
    /// SHA-256 content digest
    pub const SHA256: Self = Self(Cow::Borrowed("sha-256"));
    /// Container layer digest
    pub const LAYER_ID: Self = Self(Cow::Borrowed("layer-id"));
    /// Document-local reference (CycloneDX `bom-ref`, SPDX `SPDXID`, Syft artifact id)
    pub const BOM_REF: Self = Self(Cow::Borrowed("bom-ref"));

    /// Create a type tag from an arbitrary string.
    ///
    /// The tag is stored as given; [`normalize_identifiers`] is responsible
    /// for trimming and lower-casing.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(Cow::Owned(tag.into()))
    }

    /// Get the tag as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this is one of the well-known tags
    #[must_use]
    pub fn is_well_known(&self) -> bool {
        [
            Self::CPE,
            Self::PURL,
            Self::SHA1,
            Self::SHA256,
            Self::LAYER_ID,
            Self::BOM_REF,
        ]
        .iter()
        .any(|known| known == self)
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentifierType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for IdentifierType {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

/// A single package identifier.
///
/// Ordering is by `(id_type, value)`, which is the canonical order of a
/// normalized identifier list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identifier {
    /// Identifier type tag
    #[serde(rename = "type")]
    pub id_type: IdentifierType,
    /// Identifier value (case preserved)
    pub value: String,
}

impl Identifier {
    /// Create a new identifier
    pub fn new(id_type: impl Into<IdentifierType>, value: impl Into<String>) -> Self {
        Self {
            id_type: id_type.into(),
            value: value.into(),
        }
    }

    /// Create a document-local reference identifier
    pub fn bom_ref(value: impl Into<String>) -> Self {
        Self::new(IdentifierType::BOM_REF, value)
    }

    /// Create a package URL identifier
    pub fn purl(value: impl Into<String>) -> Self {
        Self::new(IdentifierType::PURL, value)
    }

    /// Create a CPE identifier
    pub fn cpe(value: impl Into<String>) -> Self {
        Self::new(IdentifierType::CPE, value)
    }

    /// Normalize a single identifier.
    ///
    /// Returns `None` when the type is empty after trimming.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let tag = self.id_type.as_str().trim();
        if tag.is_empty() {
            return None;
        }
        Some(Self {
            id_type: IdentifierType::new(tag.to_lowercase()),
            value: self.value.trim().to_string(),
        })
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id_type, self.value)
    }
}

/// Normalize an identifier list.
///
/// Trims types and values, lower-cases types, drops entries with an empty
/// type, removes exact duplicates and sorts by `(type, value)`. Values keep
/// their case. The operation is idempotent.
#[must_use]
pub fn normalize_identifiers<'a, I>(ids: I) -> Vec<Identifier>
where
    I: IntoIterator<Item = &'a Identifier>,
{
    let mut normalized: Vec<Identifier> = ids
        .into_iter()
        .filter_map(Identifier::normalized)
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Build the match key of an identifier list.
///
/// The key concatenates `type:value|` over the normalized identifiers, so two
/// lists produce the same key iff they hold the same pairs.
#[must_use]
pub fn match_key(ids: &[Identifier]) -> String {
    key_of_normalized(&normalize_identifiers(ids))
}

fn key_of_normalized(ids: &[Identifier]) -> String {
    let mut key = String::with_capacity(ids.iter().map(|id| id.value.len() + 12).sum());
    for id in ids {
        key.push_str(id.id_type.as_str());
        key.push(':');
        key.push_str(&id.value);
        key.push('|');
    }
    key
}

/// Return only the document-local references of an identifier list.
#[must_use]
pub fn bom_refs(ids: &[Identifier]) -> Vec<Identifier> {
    ids.iter()
        .filter(|id| id.id_type == IdentifierType::BOM_REF)
        .cloned()
        .collect()
}

/// A normalized identifier set with a precomputed match key.
///
/// Equality and hashing use the key, i.e. exact set equality.
#[derive(Debug, Clone)]
pub struct MatchableId {
    ids: Vec<Identifier>,
    key: String,
}

impl MatchableId {
    /// Build a matcher from any identifier list.
    #[must_use]
    pub fn new(ids: &[Identifier]) -> Self {
        let ids = normalize_identifiers(ids);
        let key = key_of_normalized(&ids);
        Self { ids, key }
    }

    /// The normalized identifiers
    #[must_use]
    pub fn identifiers(&self) -> &[Identifier] {
        &self.ids
    }

    /// The match key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true if the set holds no identifiers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Project this set onto the identifiers of `other`.
    ///
    /// Each identifier `(t, v)` becomes `(t, v)` if `other` carries that exact
    /// pair, `(t, w)` with the first value `w` of type `t` in `other`
    /// otherwise, or the placeholder `(t, "")` if `other` has no identifier
    /// of type `t`. `other` is expected to be normalized.
    #[must_use]
    pub fn project_onto(&self, other: &[Identifier]) -> Self {
        let projected: Vec<Identifier> = self
            .ids
            .iter()
            .map(|mine| {
                if other.contains(mine) {
                    return mine.clone();
                }
                let value = other
                    .iter()
                    .find(|theirs| theirs.id_type == mine.id_type)
                    .map(|theirs| theirs.value.clone())
                    .unwrap_or_default();
                Identifier {
                    id_type: mine.id_type.clone(),
                    value,
                }
            })
            .collect();
        Self::new(&projected)
    }

    /// Check that every identifier type of this set agrees with `other`.
    ///
    /// Types carried only by `other` are ignored. A type carried by this set
    /// with a value `other` does not hold, including a type `other` lacks
    /// entirely, makes the check fail.
    #[must_use]
    pub fn is_consistent_subset_of(&self, other: &[Identifier]) -> bool {
        self.project_onto(other) == *self
    }

    /// Check that the two sets agree on every type both of them carry.
    ///
    /// Weaker than [`Self::is_consistent_subset_of`]: a type `other` lacks is
    /// not a conflict. A shared type conflicts when none of this set's values
    /// of that type appear in `other`.
    #[must_use]
    pub fn is_compatible_with(&self, other: &[Identifier]) -> bool {
        self.ids.iter().all(|mine| {
            let shares_type = other.iter().any(|theirs| theirs.id_type == mine.id_type);
            !shares_type
                || self
                    .ids
                    .iter()
                    .filter(|id| id.id_type == mine.id_type)
                    .any(|id| other.contains(id))
        })
    }

    /// Count the identifiers of this set that `other` holds exactly.
    #[must_use]
    pub fn exact_hits(&self, other: &[Identifier]) -> usize {
        self.ids.iter().filter(|id| other.contains(id)).count()
    }
}

impl PartialEq for MatchableId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for MatchableId {}

impl Hash for MatchableId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for MatchableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(t: &str, v: &str) -> Identifier {
        Identifier::new(t, v)
    }

    #[test]
    fn test_normalize_trims_and_lowercases_type() {
        let ids = vec![id("  PURL ", " pkg:npm/a@1 "), id("Bom-Ref", "Ref-A")];
        let normalized = normalize_identifiers(&ids);
        assert_eq!(
            normalized,
            vec![id("bom-ref", "Ref-A"), id("purl", "pkg:npm/a@1")]
        );
    }

    #[test]
    fn test_normalize_drops_empty_type_and_duplicates() {
        let ids = vec![
            id("", "orphan"),
            id("   ", "orphan"),
            id("cpe", "x"),
            id("CPE", "x"),
        ];
        assert_eq!(normalize_identifiers(&ids), vec![id("cpe", "x")]);
    }

    #[test]
    fn test_normalize_keeps_value_case() {
        let normalized = normalize_identifiers(&[id("sha-256", "ABCdef")]);
        assert_eq!(normalized[0].value, "ABCdef");
    }

    #[test]
    fn test_normalize_idempotent() {
        let ids = vec![id(" b ", "2"), id("A", "1"), id("a", "1")];
        let once = normalize_identifiers(&ids);
        let twice = normalize_identifiers(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_match_key_order_independent() {
        let a = vec![id("purl", "pkg:npm/a@1"), id("bom-ref", "a")];
        let b = vec![id("bom-ref", "a"), id("purl", "pkg:npm/a@1")];
        assert_eq!(match_key(&a), match_key(&b));
        assert_eq!(match_key(&a), "bom-ref:a|purl:pkg:npm/a@1|");
    }

    #[test]
    fn test_subset_shared_types_only() {
        let mine = MatchableId::new(&[id("A", "1")]);
        assert!(mine.is_consistent_subset_of(&normalize_identifiers(&[
            id("A", "1"),
            id("B", "2")
        ])));
        assert!(!mine.is_consistent_subset_of(&normalize_identifiers(&[
            id("A", "2"),
            id("B", "2")
        ])));
    }

    #[test]
    fn test_subset_missing_type_is_conflict() {
        let mine = MatchableId::new(&[id("bom-ref", "a"), id("sha-256", "abc")]);
        let other = normalize_identifiers(&[id("bom-ref", "a")]);
        assert!(!mine.is_consistent_subset_of(&other));
    }

    #[test]
    fn test_subset_with_multiple_values_of_one_type() {
        let mine = MatchableId::new(&[id("sha-1", "bbb")]);
        let other = normalize_identifiers(&[id("sha-1", "aaa"), id("sha-1", "bbb")]);
        assert!(mine.is_consistent_subset_of(&other));
    }

    #[test]
    fn test_subset_reflexive() {
        let ids = normalize_identifiers(&[id("purl", "pkg:npm/a@1"), id("cpe", "cpe:2.3:a")]);
        let mine = MatchableId::new(&ids);
        assert!(mine.is_consistent_subset_of(&ids));
    }

    #[test]
    fn test_compatible_ignores_missing_types() {
        let mine = MatchableId::new(&[id("bom-ref", "a"), id("sha-256", "abc")]);
        assert!(mine.is_compatible_with(&normalize_identifiers(&[id("bom-ref", "a")])));
        assert!(!mine.is_compatible_with(&normalize_identifiers(&[
            id("bom-ref", "a"),
            id("sha-256", "def")
        ])));
        assert_eq!(mine.exact_hits(&[id("bom-ref", "a")]), 1);
    }

    #[test]
    fn test_projection_placeholder() {
        let mine = MatchableId::new(&[id("cpe", "x"), id("purl", "p")]);
        let projected = mine.project_onto(&[id("purl", "p")]);
        assert_eq!(projected.key(), "cpe:|purl:p|");
    }

    #[test]
    fn test_equality_is_exact() {
        let a = MatchableId::new(&[id("a", "1")]);
        let b = MatchableId::new(&[id("a", "1"), id("b", "2")]);
        assert_ne!(a, b);
        assert_eq!(a, MatchableId::new(&[id("A", " 1 ")]));
    }

    #[test]
    fn test_bom_refs() {
        let ids = vec![id("bom-ref", "a"), id("purl", "p"), id("bom-ref", "b")];
        assert_eq!(bom_refs(&ids).len(), 2);
    }

    #[test]
    fn test_identifier_type_constants() {
        assert!(IdentifierType::new("purl").is_well_known());
        assert!(!IdentifierType::new("swid").is_well_known());
        assert_eq!(Identifier::bom_ref("x").to_string(), "bom-ref:x");
    }
}
