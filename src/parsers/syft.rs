//! Syft native JSON decoder.
//!
//! Artifacts become records. `contains` and `dependency-of` relationships
//! become dependency references on artifact ids; other relationship kinds
//! are ignored.

use super::traits::{Decoded, FormatConfidence, FormatDetection, ParseError, SbomDecoder};
use super::has_value;
use crate::model::{
    Identifier, IdentifierType, PackageSource, PackageWithDependencyRefs, Purl, RawPackage,
    SyftSource,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Decoder for Syft JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct SyftDecoder;

impl SyftDecoder {
    /// Create a new Syft decoder
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn convert(&self, doc: &SyftDocument, source_path: &str) -> Decoded {
        let mut depends_on: HashMap<&str, Vec<&str>> = HashMap::new();
        for rel in &doc.artifact_relationships {
            let (from, to) = match rel.relationship_type.as_str() {
                "contains" => (&rel.parent, &rel.child),
                "dependency-of" => (&rel.child, &rel.parent),
                _ => continue,
            };
            depends_on.entry(from.as_str()).or_default().push(to.as_str());
        }

        let mut decoded = Decoded::default();
        for artifact in &doc.artifacts {
            match self.convert_artifact(artifact, source_path) {
                Ok(Some(package)) => {
                    let dependencies = depends_on
                        .get(artifact.id.as_str())
                        .map(|ids| ids.iter().map(|id| vec![Identifier::bom_ref(*id)]).collect())
                        .unwrap_or_default();
                    decoded.records.push(PackageWithDependencyRefs {
                        package,
                        dependencies,
                    });
                }
                Ok(None) => {
                    tracing::debug!(name = %artifact.name, "Skipping Syft artifact without purl");
                }
                Err(e) => decoded.push_error(e),
            }
        }
        decoded
    }

    fn convert_artifact(
        &self,
        artifact: &SyftArtifact,
        source_path: &str,
    ) -> Result<Option<RawPackage>, String> {
        let Some(purl) = artifact.purl.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        Purl::parse(purl).map_err(|e| {
            ParseError::InvalidPurl(format!("artifact '{}': {e}", artifact.id)).to_string()
        })?;

        let mut package = RawPackage::new(artifact.name.trim(), purl).with_source(
            PackageSource::Syft(SyftSource {
                artifact_id: artifact.id.clone(),
                artifact_type: artifact.artifact_type.clone(),
                found_by: artifact.found_by.clone(),
            }),
            source_path,
        );
        package.version = artifact.version.clone();

        if has_value(&artifact.id) {
            package.identifiers.push(Identifier::bom_ref(artifact.id.trim()));
        }
        package.identifiers.push(Identifier::purl(purl));
        for cpe in &artifact.cpes {
            package.identifiers.push(Identifier::cpe(cpe.value()));
        }
        for location in &artifact.locations {
            package.locations.push(location.path.clone());
            if let Some(layer) = location.layer_id.as_deref().filter(|l| has_value(l)) {
                package
                    .identifiers
                    .push(Identifier::new(IdentifierType::LAYER_ID, layer));
            }
        }
        package
            .licenses
            .extend(artifact.licenses.iter().map(|l| l.value().to_string()));

        Ok(Some(package))
    }
}

impl SbomDecoder for SyftDecoder {
    fn decode(&self, content: &str, source_path: &str) -> Result<Decoded, ParseError> {
        let doc: SyftDocument = serde_json::from_str(content)?;
        if doc.artifacts.is_empty() && doc.schema.is_none() {
            return Err(ParseError::InvalidStructure(
                "no Syft artifacts or schema".to_string(),
            ));
        }
        Ok(self.convert(&doc, source_path))
    }

    fn supported_versions(&self) -> Vec<&str> {
        vec!["16", "15", "14", "13", "12", "11"]
    }

    fn format_name(&self) -> &str {
        "Syft"
    }

    fn detect(&self, content: &str) -> FormatDetection {
        if !content.trim_start().starts_with('{') {
            return FormatDetection::no_match();
        }
        let has_artifacts = content.contains("\"artifacts\"");

        if content.contains("anchore/syft") {
            FormatDetection::with_confidence(FormatConfidence::CERTAIN).variant("JSON")
        } else if has_artifacts && content.contains("\"artifactRelationships\"") {
            FormatDetection::with_confidence(FormatConfidence::HIGH).variant("JSON")
        } else if has_artifacts {
            FormatDetection::with_confidence(FormatConfidence::LOW)
                .variant("JSON")
                .warning("Missing Syft schema reference")
        } else {
            FormatDetection::no_match()
        }
    }
}

// Syft JSON structures for deserialization

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyftDocument {
    #[serde(default)]
    artifacts: Vec<SyftArtifact>,
    #[serde(default)]
    artifact_relationships: Vec<SyftRelationship>,
    schema: Option<SyftSchema>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct SyftSchema {
    #[serde(default)]
    version: String,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyftArtifact {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    version: Option<String>,
    #[serde(rename = "type")]
    artifact_type: Option<String>,
    found_by: Option<String>,
    purl: Option<String>,
    #[serde(default)]
    locations: Vec<SyftLocation>,
    #[serde(default)]
    licenses: Vec<SyftLicense>,
    #[serde(default)]
    cpes: Vec<SyftCpe>,
}

#[derive(Debug, Deserialize)]
struct SyftLocation {
    path: String,
    #[serde(rename = "layerID")]
    layer_id: Option<String>,
}

/// Older schemas list plain strings, newer ones objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SyftLicense {
    Plain(String),
    Detailed {
        value: String,
        #[serde(rename = "spdxExpression", default)]
        spdx_expression: String,
    },
}

impl SyftLicense {
    fn value(&self) -> &str {
        match self {
            Self::Plain(value) => value,
            Self::Detailed {
                value,
                spdx_expression,
            } => {
                if spdx_expression.is_empty() {
                    value
                } else {
                    spdx_expression
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SyftCpe {
    Plain(String),
    Detailed { cpe: String },
}

impl SyftCpe {
    fn value(&self) -> &str {
        match self {
            Self::Plain(cpe) | Self::Detailed { cpe } => cpe,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SyftRelationship {
    parent: String,
    child: String,
    #[serde(rename = "type")]
    relationship_type: String,
}
