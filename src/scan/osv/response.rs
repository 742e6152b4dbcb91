//! OSV API request and response types.
//!
//! These types model the `/v1/query` endpoint.
//! See: https://google.github.io/osv.dev/api/

use crate::scan::{QueryKey, SeverityScore, Vulnerability};
use serde::{Deserialize, Serialize};

/// Query for one package version.
#[derive(Debug, Clone, Serialize)]
pub struct OsvQuery {
    pub package: OsvPackage,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

/// Package info with name and ecosystem.
#[derive(Debug, Clone, Serialize)]
pub struct OsvPackage {
    pub name: String,
    pub ecosystem: String,
}

impl OsvQuery {
    #[must_use]
    pub fn from_key(key: &QueryKey) -> Self {
        Self {
            package: OsvPackage {
                name: key.name.clone(),
                ecosystem: key.ecosystem.to_string(),
            },
            version: key.version.clone(),
            page_token: None,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvQueryResponse {
    #[serde(default)]
    pub vulns: Vec<OsvVulnerability>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// OSV vulnerability entry.
#[derive(Debug, Clone, Deserialize)]
pub struct OsvVulnerability {
    /// Vulnerability ID (e.g., "GHSA-xxx", "CVE-xxx")
    pub id: String,

    /// Brief summary
    #[serde(default)]
    pub summary: Option<String>,

    /// Detailed description
    #[serde(default)]
    pub details: Option<String>,

    /// Aliases (e.g., CVE IDs)
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Publication date
    #[serde(default)]
    pub published: Option<String>,

    /// Last modification date
    #[serde(default)]
    pub modified: Option<String>,

    /// Severity information
    #[serde(default)]
    pub severity: Vec<OsvSeverity>,
}

/// OSV severity information.
#[derive(Debug, Clone, Deserialize)]
pub struct OsvSeverity {
    /// Severity type (e.g., "CVSS_V3")
    #[serde(rename = "type")]
    pub severity_type: String,

    /// Score or vector string
    pub score: String,
}

impl From<OsvVulnerability> for Vulnerability {
    fn from(osv: OsvVulnerability) -> Self {
        Self {
            id: osv.id,
            summary: osv.summary,
            details: osv.details,
            aliases: osv.aliases,
            severity: osv
                .severity
                .into_iter()
                .map(|s| SeverityScore {
                    kind: s.severity_type,
                    score: s.score,
                })
                .collect(),
            published: osv.published,
            modified: osv.modified,
            vex: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_body() {
        let key = QueryKey {
            ecosystem: "PyPI",
            name: "jinja2".to_string(),
            version: "2.4.1".to_string(),
        };
        let json = serde_json::to_value(OsvQuery::from_key(&key)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"package": {"name": "jinja2", "ecosystem": "PyPI"}, "version": "2.4.1"})
        );
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{"vulns": [{
            "id": "GHSA-462w-v97r-4m45",
            "summary": "Jinja2 sandbox escape",
            "aliases": ["CVE-2019-10906"],
            "severity": [{"type": "CVSS_V3", "score": "CVSS:3.0/AV:N/AC:L/PR:N/UI:N/S:C/C:H/I:N/A:N"}],
            "affected": [{"package": {"name": "jinja2", "ecosystem": "PyPI"}}]
        }]}"#;
        let response: OsvQueryResponse = serde_json::from_str(body).unwrap();
        assert!(response.next_page_token.is_none());
        let vuln = Vulnerability::from(response.vulns[0].clone());
        assert_eq!(vuln.aliases, ["CVE-2019-10906"]);
        assert_eq!(vuln.severity[0].kind, "CVSS_V3");
    }

    #[test]
    fn test_empty_response() {
        let response: OsvQueryResponse = serde_json::from_str("{}").unwrap();
        assert!(response.vulns.is_empty());
    }
}
