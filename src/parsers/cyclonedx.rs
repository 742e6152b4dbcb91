//! CycloneDX decoder.
//!
//! Supports CycloneDX 1.3 to 1.6 in JSON and XML. Only components carrying a
//! package URL become records; dependency references are the `bom-ref`s listed
//! in the document's `dependencies` section, followed by those of any
//! `compositions` entry naming the component.

use super::traits::{
    Decoded, FormatConfidence, FormatDetection, ParseError, SbomDecoder,
};
use super::{digest_identifier, has_value};
use crate::model::{
    CycloneDxSource, Identifier, PackageSource, PackageWithDependencyRefs, Purl, RawPackage,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Decoder for CycloneDX documents
#[derive(Debug, Clone, Copy, Default)]
pub struct CycloneDxDecoder;

impl CycloneDxDecoder {
    /// Create a new CycloneDX decoder
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a CycloneDX JSON document
    pub fn decode_json(&self, content: &str, source_path: &str) -> Result<Decoded, ParseError> {
        let bom: CycloneDxBom = serde_json::from_str(content)?;
        match bom.bom_format.as_deref() {
            Some(format) if !format.eq_ignore_ascii_case("CycloneDX") => {
                return Err(ParseError::InvalidStructure(format!(
                    "bomFormat is '{format}', expected CycloneDX"
                )));
            }
            None if bom.spec_version.is_none() => {
                return Err(ParseError::MissingField("bomFormat".to_string()));
            }
            _ => {}
        }
        Ok(self.convert(&bom, source_path))
    }

    /// Decode a CycloneDX XML document
    pub fn decode_xml(&self, content: &str, source_path: &str) -> Result<Decoded, ParseError> {
        let xml: CycloneDxBomXml = quick_xml::de::from_str(content)?;

        // Convert XML structure to common BOM structure
        let bom = CycloneDxBom {
            bom_format: Some("CycloneDX".to_string()),
            spec_version: xml.version,
            metadata: xml.metadata.map(|m| CdxMetadata {
                component: m.component.map(CdxComponent::from),
            }),
            components: xml
                .components
                .map(CdxComponentsXml::into_components)
                .unwrap_or_default(),
            dependencies: xml
                .dependencies
                .map(|d| d.dependency.into_iter().map(CdxDependency::from).collect())
                .unwrap_or_default(),
            compositions: xml
                .compositions
                .map(|c| c.composition.into_iter().map(CdxComposition::from).collect())
                .unwrap_or_default(),
        };

        Ok(self.convert(&bom, source_path))
    }

    /// Convert a BOM into package records
    fn convert(&self, bom: &CycloneDxBom, source_path: &str) -> Decoded {
        let mut depends_on: HashMap<&str, Vec<&str>> = HashMap::new();
        for dependency in &bom.dependencies {
            depends_on
                .entry(dependency.ref_field.trim())
                .or_default()
                .extend(dependency.depends_on.iter().map(String::as_str));
        }
        for composition in &bom.compositions {
            if let Some(bom_ref) = composition.bom_ref.as_deref().filter(|r| has_value(r)) {
                depends_on
                    .entry(bom_ref.trim())
                    .or_default()
                    .extend(composition.dependencies.iter().map(String::as_str));
            }
        }

        let mut components: Vec<&CdxComponent> = Vec::new();
        if let Some(root) = bom.metadata.as_ref().and_then(|m| m.component.as_ref()) {
            collect_components(std::slice::from_ref(root), &mut components);
        }
        collect_components(&bom.components, &mut components);

        let mut decoded = Decoded::default();
        for component in components {
            match self.convert_component(component, bom.spec_version.as_deref(), source_path) {
                Ok(Some(package)) => {
                    let dependencies = component
                        .bom_ref
                        .as_deref()
                        .and_then(|r| depends_on.get(r.trim()))
                        .map(|refs| {
                            refs.iter()
                                .filter(|r| has_value(r))
                                .map(|r| vec![Identifier::bom_ref(*r)])
                                .collect()
                        })
                        .unwrap_or_default();
                    decoded.records.push(PackageWithDependencyRefs {
                        package,
                        dependencies,
                    });
                }
                Ok(None) => {
                    tracing::debug!(name = %component.name, "Skipping CycloneDX component without purl");
                }
                Err(e) => decoded.push_error(e),
            }
        }

        decoded
    }

    /// Convert one component, or `None` if it has no purl
    fn convert_component(
        &self,
        cdx: &CdxComponent,
        spec_version: Option<&str>,
        source_path: &str,
    ) -> Result<Option<RawPackage>, String> {
        let Some(purl) = cdx.purl.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
            return Ok(None);
        };
        Purl::parse(purl).map_err(|e| {
            ParseError::InvalidPurl(format!("component '{}': {e}", cdx.name)).to_string()
        })?;

        let name = match cdx.group.as_deref().map(str::trim) {
            Some(group) if !group.is_empty() => format!("{group}/{}", cdx.name.trim()),
            _ => cdx.name.trim().to_string(),
        };

        let mut package = RawPackage::new(name, purl).with_source(
            PackageSource::CycloneDx(CycloneDxSource {
                bom_ref: cdx.bom_ref.clone(),
                component_type: cdx.component_type.clone(),
                spec_version: spec_version.map(str::to_string),
            }),
            source_path,
        );
        package.version = cdx.version.clone();

        if let Some(bom_ref) = cdx.bom_ref.as_deref().filter(|r| has_value(r)) {
            package.identifiers.push(Identifier::bom_ref(bom_ref));
        }
        package.identifiers.push(Identifier::purl(purl));
        if let Some(cpe) = cdx.cpe.as_deref().filter(|c| has_value(c)) {
            package.identifiers.push(Identifier::cpe(cpe));
        }
        for hash in &cdx.hashes {
            package
                .identifiers
                .push(digest_identifier(&hash.alg, &hash.content));
        }

        for choice in &cdx.licenses {
            if let Some(license) = &choice.license {
                if let Some(id) = license.id.as_ref().or(license.name.as_ref()) {
                    package.licenses.push(id.clone());
                }
            }
            if let Some(expression) = &choice.expression {
                package.licenses.push(expression.clone());
            }
        }

        if let Some(copyright) = cdx.copyright.as_deref().filter(|c| has_value(c)) {
            package.copyright.push(copyright.to_string());
        }
        package.locations.push(purl.to_string());
        if let Some(evidence) = &cdx.evidence {
            package
                .locations
                .extend(evidence.occurrences.iter().map(|o| o.location.clone()));
        }

        Ok(Some(package))
    }
}

/// Flatten nested components in document order
fn collect_components<'a>(components: &'a [CdxComponent], out: &mut Vec<&'a CdxComponent>) {
    for component in components {
        out.push(component);
        collect_components(&component.components, out);
    }
}

impl SbomDecoder for CycloneDxDecoder {
    fn decode(&self, content: &str, source_path: &str) -> Result<Decoded, ParseError> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') {
            self.decode_json(content, source_path)
        } else if trimmed.starts_with('<') {
            self.decode_xml(content, source_path)
        } else {
            Err(ParseError::UnknownFormat(
                "Expected JSON or XML CycloneDX format".to_string(),
            ))
        }
    }

    fn supported_versions(&self) -> Vec<&str> {
        vec!["1.3", "1.4", "1.5", "1.6"]
    }

    fn format_name(&self) -> &str {
        "CycloneDX"
    }

    fn detect(&self, content: &str) -> FormatDetection {
        let trimmed = content.trim_start();

        if trimmed.starts_with('{') {
            let has_bom_format = content.contains("\"bomFormat\"");
            let has_cyclonedx = content.contains("CycloneDX") || content.contains("cyclonedx");
            let version = super::extract_json_string(content, "specVersion");

            if has_bom_format && has_cyclonedx {
                return FormatDetection::with_confidence(FormatConfidence::CERTAIN)
                    .variant("JSON")
                    .version(version);
            } else if has_bom_format {
                return FormatDetection::with_confidence(FormatConfidence::HIGH)
                    .variant("JSON")
                    .version(version);
            } else if version.is_some() && content.contains("\"components\"") {
                return FormatDetection::with_confidence(FormatConfidence::MEDIUM)
                    .variant("JSON")
                    .warning("Missing bomFormat field - might not be CycloneDX");
            }
        }

        if trimmed.starts_with('<') && content.contains("<bom") {
            let version = extract_xml_version(content);
            return if content.contains("cyclonedx.org") {
                FormatDetection::with_confidence(FormatConfidence::CERTAIN)
                    .variant("XML")
                    .version(version)
            } else {
                FormatDetection::with_confidence(FormatConfidence::MEDIUM)
                    .variant("XML")
                    .version(version)
                    .warning("Missing CycloneDX namespace")
            };
        }

        FormatDetection::no_match()
    }
}

/// Extract the CycloneDX `specVersion` from the `xmlns` of the `<bom>` element
fn extract_xml_version(content: &str) -> Option<String> {
    let bom = &content[content.find("<bom")?..];
    let tag = &bom[..bom.find('>')?];
    let ns = &tag[tag.find("cyclonedx.org/schema/bom/")? + "cyclonedx.org/schema/bom/".len()..];
    let end = ns.find(['"', '\''])?;
    Some(ns[..end].to_string())
}

// =============================================================================
// CycloneDX JSON structures for deserialization
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxBom {
    bom_format: Option<String>,
    spec_version: Option<String>,
    metadata: Option<CdxMetadata>,
    #[serde(default)]
    components: Vec<CdxComponent>,
    #[serde(default)]
    dependencies: Vec<CdxDependency>,
    #[serde(default)]
    compositions: Vec<CdxComposition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxMetadata {
    component: Option<CdxComponent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxComponent {
    #[serde(rename = "type")]
    component_type: Option<String>,
    #[serde(alias = "bom-ref")]
    bom_ref: Option<String>,
    #[serde(default)]
    name: String,
    version: Option<String>,
    group: Option<String>,
    purl: Option<String>,
    cpe: Option<String>,
    copyright: Option<String>,
    #[serde(default)]
    licenses: Vec<CdxLicenseChoice>,
    #[serde(default)]
    hashes: Vec<CdxHash>,
    evidence: Option<CdxEvidence>,
    #[serde(default)]
    components: Vec<CdxComponent>,
}

#[derive(Debug, Deserialize)]
struct CdxLicenseChoice {
    license: Option<CdxLicense>,
    expression: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxLicense {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxHash {
    alg: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CdxEvidence {
    #[serde(default)]
    occurrences: Vec<CdxOccurrence>,
}

#[derive(Debug, Deserialize)]
struct CdxOccurrence {
    location: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxDependency {
    #[serde(rename = "ref")]
    ref_field: String,
    #[serde(default)]
    depends_on: Vec<String>,
}

/// Completeness statement; only its `bom-ref` and `dependencies` are used
#[derive(Debug, Deserialize)]
struct CdxComposition {
    #[serde(rename = "bom-ref")]
    bom_ref: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

// =============================================================================
// CycloneDX XML structures for deserialization
// XML uses wrapper elements for collections (e.g., <components><component>...)
// =============================================================================

/// Root BOM element for XML format
#[derive(Debug, Deserialize)]
#[serde(rename = "bom")]
struct CycloneDxBomXml {
    /// Document version attribute; `specVersion` lives in `xmlns`
    #[serde(rename = "@version")]
    version: Option<String>,
    metadata: Option<CdxMetadataXml>,
    components: Option<CdxComponentsXml>,
    dependencies: Option<CdxDependenciesXml>,
    compositions: Option<CdxCompositionsXml>,
}

#[derive(Debug, Deserialize)]
struct CdxMetadataXml {
    component: Option<CdxComponentXml>,
}

#[derive(Debug, Deserialize)]
struct CdxComponentsXml {
    #[serde(rename = "component", default)]
    component: Vec<CdxComponentXml>,
}

impl CdxComponentsXml {
    fn into_components(self) -> Vec<CdxComponent> {
        self.component.into_iter().map(CdxComponent::from).collect()
    }
}

#[derive(Debug, Deserialize)]
struct CdxComponentXml {
    #[serde(rename = "@type")]
    component_type: Option<String>,
    #[serde(rename = "@bom-ref")]
    bom_ref: Option<String>,
    #[serde(default)]
    name: String,
    version: Option<String>,
    group: Option<String>,
    purl: Option<String>,
    cpe: Option<String>,
    copyright: Option<String>,
    licenses: Option<CdxLicensesXml>,
    hashes: Option<CdxHashesXml>,
    evidence: Option<CdxEvidenceXml>,
    components: Option<CdxComponentsXml>,
}

impl From<CdxComponentXml> for CdxComponent {
    fn from(xml: CdxComponentXml) -> Self {
        Self {
            component_type: xml.component_type,
            bom_ref: xml.bom_ref,
            name: xml.name,
            version: xml.version,
            group: xml.group,
            purl: xml.purl,
            cpe: xml.cpe,
            copyright: xml.copyright,
            licenses: xml
                .licenses
                .map(|l| l.licenses.into_iter().map(CdxLicenseChoice::from).collect())
                .unwrap_or_default(),
            hashes: xml
                .hashes
                .map(|h| {
                    h.hash
                        .into_iter()
                        .map(|h| CdxHash {
                            alg: h.alg,
                            content: h.content,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            evidence: xml.evidence.map(|e| CdxEvidence {
                occurrences: e
                    .occurrences
                    .map(|o| o.occurrence)
                    .unwrap_or_default(),
            }),
            components: xml
                .components
                .map(CdxComponentsXml::into_components)
                .unwrap_or_default(),
        }
    }
}

/// Licenses wrapper: a sequence of `<license>` and `<expression>` elements
#[derive(Debug, Deserialize)]
struct CdxLicensesXml {
    #[serde(rename = "$value", default)]
    licenses: Vec<CdxLicenseChoiceXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CdxLicenseChoiceXml {
    License(CdxLicense),
    Expression(String),
}

impl From<CdxLicenseChoiceXml> for CdxLicenseChoice {
    fn from(xml: CdxLicenseChoiceXml) -> Self {
        match xml {
            CdxLicenseChoiceXml::License(license) => Self {
                license: Some(license),
                expression: None,
            },
            CdxLicenseChoiceXml::Expression(expression) => Self {
                license: None,
                expression: Some(expression),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct CdxHashesXml {
    #[serde(rename = "hash", default)]
    hash: Vec<CdxHashXml>,
}

#[derive(Debug, Deserialize)]
struct CdxHashXml {
    #[serde(rename = "@alg")]
    alg: String,
    #[serde(rename = "$text")]
    content: String,
}

#[derive(Debug, Deserialize)]
struct CdxEvidenceXml {
    occurrences: Option<CdxOccurrencesXml>,
}

#[derive(Debug, Deserialize)]
struct CdxOccurrencesXml {
    #[serde(rename = "occurrence", default)]
    occurrence: Vec<CdxOccurrence>,
}

#[derive(Debug, Deserialize)]
struct CdxDependenciesXml {
    #[serde(rename = "dependency", default)]
    dependency: Vec<CdxDependencyXml>,
}

/// Dependency element; nested `<dependency ref=".."/>` children are the targets
#[derive(Debug, Deserialize)]
struct CdxDependencyXml {
    #[serde(rename = "@ref")]
    ref_field: String,
    #[serde(rename = "dependency", default)]
    depends_on: Vec<CdxDependencyRefXml>,
}

#[derive(Debug, Deserialize)]
struct CdxDependencyRefXml {
    #[serde(rename = "@ref")]
    ref_field: String,
}

impl From<CdxDependencyXml> for CdxDependency {
    fn from(xml: CdxDependencyXml) -> Self {
        Self {
            ref_field: xml.ref_field,
            depends_on: xml.depends_on.into_iter().map(|d| d.ref_field).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CdxCompositionsXml {
    #[serde(rename = "composition", default)]
    composition: Vec<CdxCompositionXml>,
}

#[derive(Debug, Deserialize)]
struct CdxCompositionXml {
    #[serde(rename = "@bom-ref")]
    bom_ref: Option<String>,
    dependencies: Option<CdxCompositionRefsXml>,
}

#[derive(Debug, Deserialize)]
struct CdxCompositionRefsXml {
    #[serde(rename = "dependency", default)]
    dependency: Vec<CdxDependencyRefXml>,
}

impl From<CdxCompositionXml> for CdxComposition {
    fn from(xml: CdxCompositionXml) -> Self {
        Self {
            bom_ref: xml.bom_ref,
            dependencies: xml
                .dependencies
                .map(|d| d.dependency.into_iter().map(|r| r.ref_field).collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IdentifierType;

    const JSON_BOM: &str = r#"{
        "bomFormat": "CycloneDX",
        "specVersion": "1.5",
        "metadata": {
            "component": {"type": "application", "bom-ref": "app", "name": "app", "version": "1.0", "purl": "pkg:npm/app@1.0"}
        },
        "components": [
            {
                "type": "library", "bom-ref": "lodash", "group": "", "name": "lodash", "version": "4.17.21",
                "purl": "pkg:npm/lodash@4.17.21",
                "licenses": [{"license": {"id": "MIT"}}, {"expression": "MIT OR Apache-2.0"}],
                "hashes": [{"alg": "SHA-256", "content": "abc123"}],
                "copyright": "JS Foundation",
                "components": [
                    {"type": "library", "bom-ref": "inner", "name": "inner", "purl": "pkg:npm/inner@1"}
                ]
            },
            {"type": "file", "bom-ref": "readme", "name": "README"},
            {"type": "library", "bom-ref": "broken", "name": "broken", "purl": "nonsense"}
        ],
        "dependencies": [
            {"ref": "app", "dependsOn": ["lodash", "external"]},
            {"ref": "lodash", "dependsOn": ["inner"]}
        ]
    }"#;

    #[test]
    fn test_decode_json() {
        let decoded = CycloneDxDecoder::new()
            .decode(JSON_BOM, "bom.cdx.json")
            .expect("decode");
        let names: Vec<&str> = decoded
            .records
            .iter()
            .map(|r| r.package.name.as_str())
            .collect();
        assert_eq!(names, ["app", "lodash", "inner"]);
        assert_eq!(decoded.errors.len(), 1);
        assert!(decoded.errors[0].contains("broken"));

        let app = &decoded.records[0];
        assert_eq!(
            app.dependencies,
            vec![
                vec![Identifier::bom_ref("lodash")],
                vec![Identifier::bom_ref("external")]
            ]
        );

        let lodash = &decoded.records[1].package;
        assert_eq!(lodash.licenses, ["MIT", "MIT OR Apache-2.0"]);
        assert_eq!(lodash.copyright, ["JS Foundation"]);
        assert!(lodash
            .identifiers
            .contains(&Identifier::new(IdentifierType::SHA256, "abc123")));
        let source = lodash.source.as_ref().and_then(|s| s.as_cyclonedx()).expect("cdx source");
        assert_eq!(source.bom_ref.as_deref(), Some("lodash"));
        assert_eq!(source.spec_version.as_deref(), Some("1.5"));
    }

    #[test]
    fn test_compositions_follow_dependencies() {
        let content = r#"{"bomFormat": "CycloneDX", "specVersion": "1.5",
            "components": [
                {"type": "application", "bom-ref": "svc", "name": "svc", "purl": "pkg:npm/svc@1"},
                {"type": "library", "bom-ref": "a", "name": "a", "purl": "pkg:npm/a@1"},
                {"type": "library", "bom-ref": "b", "name": "b", "purl": "pkg:npm/b@1"}
            ],
            "dependencies": [{"ref": "svc", "dependsOn": ["a"]}],
            "compositions": [
                {"aggregate": "complete", "bom-ref": "svc", "dependencies": ["b"]},
                {"aggregate": "unknown", "assemblies": ["a"]}
            ]}"#;
        let decoded = CycloneDxDecoder::new().decode(content, "svc.cdx.json").expect("decode");
        assert_eq!(
            decoded.records[0].dependencies,
            vec![vec![Identifier::bom_ref("a")], vec![Identifier::bom_ref("b")]]
        );
        assert!(decoded.records[1].dependencies.is_empty());
        assert_eq!(decoded.records[0].package.locations, ["pkg:npm/svc@1"]);
    }

    #[test]
    fn test_xml_compositions() {
        let content = r#"<bom xmlns="http://cyclonedx.org/schema/bom/1.5" version="1">
  <components>
    <component type="library" bom-ref="a"><name>a</name><purl>pkg:npm/a@1</purl></component>
    <component type="library" bom-ref="b"><name>b</name><purl>pkg:npm/b@1</purl></component>
  </components>
  <compositions>
    <composition bom-ref="a">
      <aggregate>complete</aggregate>
      <dependencies><dependency ref="b"/></dependencies>
    </composition>
  </compositions>
</bom>"#;
        let decoded = CycloneDxDecoder::new().decode(content, "a.cdx.xml").expect("decode");
        assert_eq!(decoded.records[0].dependencies, vec![vec![Identifier::bom_ref("b")]]);
    }

    #[test]
    fn test_group_prefixes_name() {
        let content = r#"{"bomFormat":"CycloneDX","specVersion":"1.4","components":[
            {"type":"library","group":"org.apache","name":"commons","purl":"pkg:maven/org.apache/commons@1"}]}"#;
        let decoded = CycloneDxDecoder::new().decode(content, "x").expect("decode");
        assert_eq!(decoded.records[0].package.name, "org.apache/commons");
    }

    #[test]
    fn test_decode_xml() {
        let content = r#"<?xml version="1.0" encoding="UTF-8"?>
<bom xmlns="http://cyclonedx.org/schema/bom/1.4" version="1">
  <components>
    <component type="library" bom-ref="a">
      <name>a</name>
      <version>1.0</version>
      <purl>pkg:npm/a@1.0</purl>
      <hashes><hash alg="SHA-1">deadbeef</hash></hashes>
      <licenses><license><id>MIT</id></license></licenses>
    </component>
    <component type="library" bom-ref="b">
      <name>b</name>
      <purl>pkg:npm/b@2.0</purl>
    </component>
  </components>
  <dependencies>
    <dependency ref="a"><dependency ref="b"/></dependency>
  </dependencies>
</bom>"#;
        let decoded = CycloneDxDecoder::new().decode(content, "bom.cdx.xml").expect("decode");
        assert_eq!(decoded.records.len(), 2);
        let a = &decoded.records[0];
        assert_eq!(a.dependencies, vec![vec![Identifier::bom_ref("b")]]);
        assert_eq!(a.package.licenses, ["MIT"]);
        assert!(a
            .package
            .identifiers
            .contains(&Identifier::new(IdentifierType::SHA1, "deadbeef")));
    }

    #[test]
    fn test_detect() {
        let decoder = CycloneDxDecoder::new();
        let detection = decoder.detect(JSON_BOM);
        assert_eq!(detection.confidence, FormatConfidence::CERTAIN);
        assert_eq!(detection.version.as_deref(), Some("1.5"));

        let xml = r#"<bom xmlns="http://cyclonedx.org/schema/bom/1.6" version="1"></bom>"#;
        let detection = decoder.detect(xml);
        assert_eq!(detection.variant.as_deref(), Some("XML"));
        assert_eq!(detection.version.as_deref(), Some("1.6"));

        assert!(!decoder.can_decode(r#"{"spdxVersion": "SPDX-2.3"}"#));
    }

    #[test]
    fn test_wrong_bom_format_rejected() {
        let err = CycloneDxDecoder::new()
            .decode(r#"{"bomFormat": "Other"}"#, "x")
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidStructure(_)));
    }
}
