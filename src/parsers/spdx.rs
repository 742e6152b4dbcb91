//! SPDX decoder.
//!
//! Supports SPDX 2.2 and 2.3 in JSON, YAML and tag-value. Packages without a
//! purl external reference get a synthesized `pkg:internal/internal/...` purl.

use super::traits::{Decoded, FormatConfidence, FormatDetection, ParseError, SbomDecoder};
use super::{digest_identifier, has_value};
use crate::model::{
    Identifier, IdentifierType, PackageSource, PackageWithDependencyRefs, Purl, RawPackage,
    SpdxSource,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Decoder for SPDX documents
#[derive(Debug, Clone, Copy, Default)]
pub struct SpdxDecoder;

impl SpdxDecoder {
    /// Create a new SPDX decoder
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode SPDX JSON
    pub fn decode_json(&self, content: &str, source_path: &str) -> Result<Decoded, ParseError> {
        let spdx: SpdxDocument = serde_json::from_str(content)?;
        Self::check_version(&spdx)?;
        Ok(self.convert(&spdx, source_path))
    }

    /// Decode SPDX YAML
    pub fn decode_yaml(&self, content: &str, source_path: &str) -> Result<Decoded, ParseError> {
        let spdx: SpdxDocument = serde_yaml::from_str(content)?;
        Self::check_version(&spdx)?;
        Ok(self.convert(&spdx, source_path))
    }

    /// Decode SPDX tag-value
    pub fn decode_tag_value(
        &self,
        content: &str,
        source_path: &str,
    ) -> Result<Decoded, ParseError> {
        let spdx = parse_tag_value(content);
        Self::check_version(&spdx)?;
        Ok(self.convert(&spdx, source_path))
    }

    fn check_version(spdx: &SpdxDocument) -> Result<(), ParseError> {
        if spdx.spdx_version.trim().starts_with("SPDX-") {
            Ok(())
        } else {
            Err(ParseError::MissingField("spdxVersion".to_string()))
        }
    }

    /// Convert a parsed document into package records
    fn convert(&self, spdx: &SpdxDocument, source_path: &str) -> Decoded {
        let mut depends_on: HashMap<&str, Vec<&str>> = HashMap::new();
        for rel in &spdx.relationships {
            let (from, to) = match dependency_direction(&rel.relationship_type) {
                Some(Direction::Forward) => (&rel.spdx_element_id, &rel.related_spdx_element),
                Some(Direction::Reverse) => (&rel.related_spdx_element, &rel.spdx_element_id),
                None => continue,
            };
            if has_value(from) && has_value(to) {
                depends_on.entry(from.trim()).or_default().push(to.trim());
            }
        }

        let version = spdx.spdx_version.trim();
        let version = version.strip_prefix("SPDX-").unwrap_or(version);

        let mut decoded = Decoded::default();
        for pkg in &spdx.packages {
            match self.convert_package(pkg, version, source_path) {
                Ok(package) => {
                    let dependencies = depends_on
                        .get(pkg.spdx_id.trim())
                        .map(|ids| ids.iter().map(|id| vec![Identifier::bom_ref(*id)]).collect())
                        .unwrap_or_default();
                    decoded.records.push(PackageWithDependencyRefs {
                        package,
                        dependencies,
                    });
                }
                Err(e) => decoded.push_error(e),
            }
        }

        decoded
    }

    fn convert_package(
        &self,
        pkg: &SpdxPackage,
        spdx_version: &str,
        source_path: &str,
    ) -> Result<RawPackage, String> {
        let name = pkg.name.trim();
        let version = pkg
            .version_info
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let declared_purl = pkg
            .external_refs
            .iter()
            .find(|r| r.reference_type.eq_ignore_ascii_case("purl"))
            .map(|r| r.reference_locator.trim());

        let (purl, synthesized_purl) = match declared_purl {
            Some(purl) => {
                Purl::parse(purl).map_err(|e| {
                    ParseError::InvalidPurl(format!("package '{}': {e}", pkg.spdx_id)).to_string()
                })?;
                (purl.to_string(), false)
            }
            None => {
                let purl = Purl::internal(name, version).map_err(|e| {
                    ParseError::InvalidPurl(format!("package '{}': {e}", pkg.spdx_id)).to_string()
                })?;
                (purl.as_str().to_string(), true)
            }
        };

        let mut package = RawPackage::new(name, purl).with_source(
            PackageSource::Spdx(SpdxSource {
                spdx_id: pkg.spdx_id.clone(),
                spdx_version: Some(spdx_version.to_string()),
                synthesized_purl,
            }),
            source_path,
        );
        package.version = pkg.version_info.clone();

        if has_value(&pkg.spdx_id) {
            package.identifiers.push(Identifier::bom_ref(pkg.spdx_id.trim()));
        }
        for ext_ref in &pkg.external_refs {
            let ref_type = ext_ref.reference_type.trim();
            let id_type = if ref_type.eq_ignore_ascii_case("purl") {
                IdentifierType::PURL
            } else if ref_type.to_ascii_lowercase().contains("cpe") {
                IdentifierType::CPE
            } else {
                IdentifierType::new(ref_type)
            };
            package
                .identifiers
                .push(Identifier::new(id_type, ext_ref.reference_locator.trim()));
        }
        for checksum in &pkg.checksums {
            package
                .identifiers
                .push(digest_identifier(&checksum.algorithm, &checksum.checksum_value));
        }

        let license = [&pkg.license_concluded, &pkg.license_declared]
            .into_iter()
            .flatten()
            .find(|l| has_value(l));
        if let Some(license) = license {
            package.licenses.push(license.trim().to_string());
        }
        if let Some(copyright) = pkg.copyright_text.as_deref().filter(|c| has_value(c)) {
            package.copyright.push(copyright.trim().to_string());
        }
        for location in [&pkg.package_file_name, &pkg.download_location]
            .into_iter()
            .flatten()
        {
            if has_value(location) {
                package.locations.push(location.trim().to_string());
            }
        }

        Ok(package)
    }

    /// Extract the SPDX version from JSON or YAML content
    fn extract_spdx_version(content: &str) -> Option<String> {
        let version = super::extract_json_string(content, "spdxVersion").or_else(|| {
            content.lines().find_map(|line| {
                line.trim_start()
                    .strip_prefix("spdxVersion:")
                    .map(|v| v.trim().trim_matches(['"', '\'']).to_string())
            })
        })?;
        Some(version.strip_prefix("SPDX-").unwrap_or(&version).to_string())
    }

    /// Extract the SPDX version from tag-value content
    fn extract_tag_value_version(content: &str) -> Option<String> {
        content.lines().find_map(|line| {
            line.strip_prefix("SPDXVersion:").map(|rest| {
                let version = rest.trim();
                version.strip_prefix("SPDX-").unwrap_or(version).to_string()
            })
        })
    }
}

fn is_tag_value(content: &str) -> bool {
    let trimmed = content.trim_start();
    trimmed.starts_with("SPDXVersion:") || trimmed.contains("\nSPDXVersion:")
}

fn is_rdf(content: &str) -> bool {
    content.trim_start().starts_with('<')
        && (content.contains("spdx.org/rdf/terms") || content.contains("SpdxDocument"))
}

/// Which side of a relationship is the dependent
enum Direction {
    /// `A <TYPE> B`: A depends on B
    Forward,
    /// `A <TYPE> B`: B depends on A
    Reverse,
}

fn dependency_direction(relationship_type: &str) -> Option<Direction> {
    let ty = relationship_type.trim().to_ascii_uppercase();
    match ty.as_str() {
        "DEPENDS_ON" | "CONTAINS" => Some(Direction::Forward),
        "CONTAINED_BY" => Some(Direction::Reverse),
        _ if ty.ends_with("DEPENDENCY_OF") => Some(Direction::Reverse),
        _ => None,
    }
}

impl SbomDecoder for SpdxDecoder {
    fn decode(&self, content: &str, source_path: &str) -> Result<Decoded, ParseError> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') {
            self.decode_json(content, source_path)
        } else if is_tag_value(content) {
            self.decode_tag_value(content, source_path)
        } else if is_rdf(content) {
            Err(ParseError::UnsupportedFormat("SPDX RDF/XML".to_string()))
        } else {
            self.decode_yaml(content, source_path)
        }
    }

    fn supported_versions(&self) -> Vec<&str> {
        vec!["2.2", "2.3"]
    }

    fn format_name(&self) -> &str {
        "SPDX"
    }

    fn detect(&self, content: &str) -> FormatDetection {
        let trimmed = content.trim_start();

        if trimmed.starts_with('{') {
            let has_spdx_version = content.contains("\"spdxVersion\"");
            let has_spdx_id = content.contains("\"SPDXID\"");
            let has_data_license = content.contains("\"dataLicense\"");
            let version = Self::extract_spdx_version(content);

            if has_spdx_version && has_spdx_id {
                return FormatDetection::with_confidence(FormatConfidence::CERTAIN)
                    .variant("JSON")
                    .version(version);
            } else if has_spdx_version || (has_spdx_id && has_data_license) {
                return FormatDetection::with_confidence(FormatConfidence::HIGH)
                    .variant("JSON")
                    .version(version);
            } else if content.contains("\"packages\"") && has_data_license {
                return FormatDetection::with_confidence(FormatConfidence::MEDIUM)
                    .variant("JSON")
                    .warning("Missing spdxVersion field");
            }
            return FormatDetection::no_match();
        }

        if is_tag_value(content) {
            let version = Self::extract_tag_value_version(content);
            let confidence = if content.contains("SPDXID:") && content.contains("DataLicense:") {
                FormatConfidence::CERTAIN
            } else {
                FormatConfidence::HIGH
            };
            return FormatDetection::with_confidence(confidence)
                .variant("tag-value")
                .version(version);
        }

        if is_rdf(content) {
            return FormatDetection::with_confidence(FormatConfidence::LOW)
                .variant("RDF/XML")
                .warning("SPDX RDF/XML is not supported");
        }

        let yaml_version = content
            .lines()
            .any(|line| line.starts_with("spdxVersion:"));
        if yaml_version {
            return FormatDetection::with_confidence(FormatConfidence::HIGH)
                .variant("YAML")
                .version(Self::extract_spdx_version(content));
        }

        FormatDetection::no_match()
    }
}

/// Parse tag-value content into the shared document structure.
///
/// `<text>` values may span several lines. Unknown tags are ignored.
fn parse_tag_value(content: &str) -> SpdxDocument {
    let mut doc = SpdxDocument::default();
    let mut current: Option<SpdxPackage> = None;
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let mut value = value.trim().to_string();

        if let Some(rest) = value.strip_prefix("<text>") {
            let mut text = rest.to_string();
            while !text.contains("</text>") {
                match lines.next() {
                    Some(next) => {
                        text.push('\n');
                        text.push_str(next);
                    }
                    None => break,
                }
            }
            value = text.replace("</text>", "").trim().to_string();
        }

        match key {
            "SPDXVersion" => doc.spdx_version = value,
            "PackageName" => {
                if let Some(pkg) = current.take() {
                    doc.packages.push(pkg);
                }
                current = Some(SpdxPackage {
                    name: value,
                    ..SpdxPackage::default()
                });
            }
            "Relationship" => {
                if let Some(rel) = parse_relationship_line(&value) {
                    doc.relationships.push(rel);
                }
            }
            // File and snippet sections end the current package
            "FileName" | "SnippetSPDXID" => {
                if let Some(pkg) = current.take() {
                    doc.packages.push(pkg);
                }
            }
            _ => {
                if let Some(pkg) = current.as_mut() {
                    apply_package_tag(pkg, key, value);
                }
            }
        }
    }

    if let Some(pkg) = current {
        doc.packages.push(pkg);
    }
    doc
}

fn apply_package_tag(pkg: &mut SpdxPackage, key: &str, value: String) {
    match key {
        "SPDXID" => pkg.spdx_id = value,
        "PackageVersion" => pkg.version_info = Some(value),
        "PackageFileName" => pkg.package_file_name = Some(value),
        "PackageDownloadLocation" => pkg.download_location = Some(value),
        "PackageLicenseConcluded" => pkg.license_concluded = Some(value),
        "PackageLicenseDeclared" => pkg.license_declared = Some(value),
        "PackageCopyrightText" => pkg.copyright_text = Some(value),
        "ExternalRef" => {
            if let Some(ext_ref) = parse_external_ref_line(&value) {
                pkg.external_refs.push(ext_ref);
            }
        }
        "PackageChecksum" => {
            if let Some(checksum) = parse_checksum_line(&value) {
                pkg.checksums.push(checksum);
            }
        }
        _ => {}
    }
}

/// `SPDXRef-A DEPENDS_ON SPDXRef-B`
fn parse_relationship_line(value: &str) -> Option<SpdxRelationship> {
    let mut parts = value.split_whitespace();
    Some(SpdxRelationship {
        spdx_element_id: parts.next()?.to_string(),
        relationship_type: parts.next()?.to_string(),
        related_spdx_element: parts.next()?.to_string(),
    })
}

/// `PACKAGE-MANAGER purl pkg:npm/foo@1.0`
fn parse_external_ref_line(value: &str) -> Option<SpdxExternalRef> {
    let mut parts = value.split_whitespace();
    Some(SpdxExternalRef {
        reference_category: parts.next()?.to_string(),
        reference_type: parts.next()?.to_string(),
        reference_locator: parts.next()?.to_string(),
    })
}

/// `SHA256: abc...`
fn parse_checksum_line(value: &str) -> Option<SpdxChecksum> {
    let (algorithm, checksum_value) = value.split_once(':')?;
    Some(SpdxChecksum {
        algorithm: algorithm.trim().to_string(),
        checksum_value: checksum_value.trim().to_string(),
    })
}

// SPDX JSON/YAML structures for deserialization

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SpdxDocument {
    spdx_version: String,
    packages: Vec<SpdxPackage>,
    relationships: Vec<SpdxRelationship>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    version_info: Option<String>,
    package_file_name: Option<String>,
    download_location: Option<String>,
    license_concluded: Option<String>,
    license_declared: Option<String>,
    copyright_text: Option<String>,
    checksums: Vec<SpdxChecksum>,
    external_refs: Vec<SpdxExternalRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxChecksum {
    algorithm: String,
    checksum_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxExternalRef {
    #[serde(default)]
    #[allow(dead_code)]
    reference_category: String,
    reference_type: String,
    reference_locator: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpdxRelationship {
    spdx_element_id: String,
    relationship_type: String,
    related_spdx_element: String,
}
