//! OpenVEX document decoder.
//!
//! Accepts v0.2.0 (object vulnerabilities and products), v0.0.1 (string
//! vulnerabilities, products and statement-level subcomponents) and the
//! Ubuntu flavor that moves the document header under `metadata`.
//! See <https://github.com/openvex/spec>.

use super::{non_empty, statement, VexError, VexJustification, VexProduct, VexStatement, VexStatus};
use serde::Deserialize;

/// Top-level OpenVEX document
#[derive(Debug, Deserialize)]
struct OpenVexDocument {
    #[serde(default)]
    statements: Vec<OpenVexStatement>,
}

#[derive(Debug, Deserialize)]
struct OpenVexStatement {
    vulnerability: OpenVexVulnerability,
    #[serde(default)]
    vuln_description: Option<String>,
    status: String,
    #[serde(default)]
    products: Vec<OpenVexComponent>,
    /// v0.0.1 only; applies to every product of the statement
    #[serde(default)]
    subcomponents: Vec<OpenVexComponent>,
    justification: Option<String>,
    impact_statement: Option<String>,
    action_statement: Option<String>,
    status_notes: Option<String>,
    timestamp: Option<String>,
}

/// A vulnerability is a bare name in v0.0.1 and an object in v0.2.0
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OpenVexVulnerability {
    Name(String),
    Detailed {
        #[serde(rename = "@id")]
        id: Option<String>,
        name: Option<String>,
        #[serde(default)]
        aliases: Vec<String>,
    },
}

/// A product or subcomponent, bare identifier or object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OpenVexComponent {
    Id(String),
    Detailed {
        #[serde(rename = "@id")]
        id: Option<String>,
        identifiers: Option<OpenVexIdentifiers>,
        #[serde(default)]
        subcomponents: Vec<OpenVexComponent>,
    },
}

#[derive(Debug, Deserialize)]
struct OpenVexIdentifiers {
    purl: Option<String>,
}

impl OpenVexComponent {
    fn into_product(self) -> VexProduct {
        match self {
            Self::Id(id) => VexProduct::from_id(&id),
            Self::Detailed {
                id,
                identifiers,
                subcomponents,
            } => {
                let identifier_purl = identifiers.and_then(|i| i.purl);
                let mut product = match (id, identifier_purl) {
                    (Some(id), Some(purl)) if !id.starts_with("pkg:") => VexProduct {
                        id: Some(id),
                        ..VexProduct::from_id(&purl)
                    },
                    (Some(id), _) => VexProduct::from_id(&id),
                    (None, Some(purl)) => VexProduct::from_id(&purl),
                    (None, None) => VexProduct {
                        id: None,
                        purl: None,
                        subcomponents: Vec::new(),
                    },
                };
                product.subcomponents = subcomponents.into_iter().map(Self::into_product).collect();
                product
            }
        }
    }
}

/// Map an OpenVEX status string, with unrecognized values as `Unknown`
fn parse_status(s: &str) -> VexStatus {
    VexStatus::parse(s).unwrap_or_else(|| {
        tracing::debug!("Unrecognized OpenVEX status '{}'", s);
        VexStatus::Unknown
    })
}

fn convert(stmt: OpenVexStatement) -> Option<VexStatement> {
    let (name, aliases) = match stmt.vulnerability {
        OpenVexVulnerability::Name(name) => (Some(name), Vec::new()),
        OpenVexVulnerability::Detailed { id, name, aliases } => (name.or(id), aliases),
    };
    let Some(name) = non_empty(name) else {
        tracing::warn!("Skipping OpenVEX statement without a vulnerability name");
        return None;
    };

    let shared: Vec<VexProduct> = stmt
        .subcomponents
        .into_iter()
        .map(OpenVexComponent::into_product)
        .collect();
    let products = stmt
        .products
        .into_iter()
        .map(|c| {
            let mut product = c.into_product();
            product.subcomponents.extend(shared.iter().cloned());
            product
        })
        .collect();

    let mut out = statement(name, parse_status(&stmt.status));
    out.aliases = aliases;
    out.justification = stmt.justification.as_deref().and_then(VexJustification::parse);
    out.impact_statement = non_empty(stmt.impact_statement);
    out.action_statement = non_empty(stmt.action_statement);
    out.status_notes = non_empty(stmt.status_notes).or(non_empty(stmt.vuln_description));
    out.timestamp = stmt.timestamp;
    out.products = products;
    Some(out)
}

/// Decode an OpenVEX document into statements.
pub(super) fn decode(content: &str) -> Result<Vec<VexStatement>, VexError> {
    let doc: OpenVexDocument = serde_json::from_str(content)?;
    if doc.statements.is_empty() {
        return Err(VexError::InvalidDocument(
            "OpenVEX document has no statements".to_string(),
        ));
    }
    Ok(doc.statements.into_iter().filter_map(convert).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Purl;

    const SAMPLE_V020: &str = r#"{
        "@context": "https://openvex.dev/ns/v0.2.0",
        "@id": "https://example.com/vex/2024-001",
        "author": "Security Team",
        "timestamp": "2024-01-15T10:00:00Z",
        "version": 1,
        "statements": [
            {
                "vulnerability": {"name": "CVE-2024-1234", "aliases": ["GHSA-abcd-efgh-ijkl"]},
                "products": [
                    {"@id": "pkg:oci/webapp@sha256%3Aabc",
                     "subcomponents": [{"@id": "pkg:pypi/jinja2@3.1.2"}]}
                ],
                "status": "not_affected",
                "justification": "vulnerable_code_not_in_execute_path",
                "impact_statement": "Templates are never user controlled"
            },
            {
                "vulnerability": {"name": "CVE-2024-5678"},
                "products": [{"@id": "urn:example:webapp", "identifiers": {"purl": "pkg:pypi/flask@3.0.0"}}],
                "status": "affected",
                "action_statement": "Upgrade to 3.0.1"
            }
        ]
    }"#;

    #[test]
    fn test_decode_v020() {
        let statements = decode(SAMPLE_V020).expect("decode");
        assert_eq!(statements.len(), 2);

        let first = &statements[0];
        assert_eq!(first.vulnerability, "CVE-2024-1234");
        assert_eq!(first.aliases, vec!["GHSA-abcd-efgh-ijkl"]);
        assert_eq!(first.status, VexStatus::NotAffected);
        assert_eq!(
            first.justification,
            Some(VexJustification::VulnerableCodeNotInExecutePath)
        );
        assert!(first.applies_to(&Purl::parse("pkg:pypi/jinja2@3.1.2").expect("valid")));

        let second = &statements[1];
        assert_eq!(second.products[0].id.as_deref(), Some("urn:example:webapp"));
        assert!(second.applies_to(&Purl::parse("pkg:pypi/flask@3.0.0").expect("valid")));
        assert_eq!(second.action_statement.as_deref(), Some("Upgrade to 3.0.1"));
    }

    #[test]
    fn test_decode_v001_strings() {
        let doc = r#"{
            "@context": "https://openvex.dev/ns",
            "statements": [{
                "vulnerability": "CVE-2023-0001",
                "vuln_description": "heap overflow",
                "products": ["pkg:apk/wolfi/busybox@1.36.1-r0"],
                "subcomponents": ["pkg:apk/wolfi/ssl_client@1.36.1-r0"],
                "status": "fixed"
            }]
        }"#;
        let statements = decode(doc).expect("decode");
        let s = &statements[0];
        assert_eq!(s.vulnerability, "CVE-2023-0001");
        assert_eq!(s.status, VexStatus::Fixed);
        assert_eq!(s.status_notes.as_deref(), Some("heap overflow"));
        assert_eq!(s.products[0].subcomponents.len(), 1);
        assert!(s.applies_to(&Purl::parse("pkg:apk/wolfi/ssl_client@1.36.1-r0").expect("valid")));
    }

    #[test]
    fn test_unknown_status() {
        let doc = r#"{"statements": [{"vulnerability": "CVE-1", "products": [], "status": "maybe"}]}"#;
        assert_eq!(decode(doc).expect("decode")[0].status, VexStatus::Unknown);
    }

    #[test]
    fn test_statement_without_name_is_skipped() {
        let doc = r#"{"statements": [
            {"vulnerability": {"aliases": []}, "status": "fixed"},
            {"vulnerability": "CVE-2", "status": "fixed"}
        ]}"#;
        let statements = decode(doc).expect("decode");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].vulnerability, "CVE-2");
    }

    #[test]
    fn test_no_statements() {
        let err = decode(r#"{"@context": "https://openvex.dev/ns/v0.2.0", "statements": []}"#)
            .unwrap_err();
        assert!(matches!(err, VexError::InvalidDocument(_)));
    }
}
