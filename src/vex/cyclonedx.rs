//! CycloneDX VEX decoder.
//!
//! Reads the `vulnerabilities` array of a CycloneDX JSON BOM. Each
//! vulnerability with an `analysis` and at least one `affects` entry becomes
//! one statement; the other ones carry no exploitability claim and are skipped.

use super::{non_empty, statement, VexError, VexJustification, VexProduct, VexStatement, VexStatus};
use crate::model::Purl;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CdxVexBom {
    #[serde(default)]
    vulnerabilities: Vec<CdxVulnerability>,
}

#[derive(Debug, Deserialize)]
struct CdxVulnerability {
    #[serde(rename = "bom-ref")]
    bom_ref: Option<String>,
    id: Option<String>,
    #[serde(default)]
    references: Vec<CdxVulnerabilityReference>,
    analysis: Option<CdxAnalysis>,
    #[serde(default)]
    affects: Vec<CdxAffects>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxVulnerabilityReference {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CdxAnalysis {
    state: Option<String>,
    justification: Option<String>,
    #[serde(default)]
    response: Vec<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxAffects {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default)]
    versions: Vec<CdxAffectedVersion>,
}

#[derive(Debug, Deserialize)]
struct CdxAffectedVersion {
    version: Option<String>,
}

/// Map a CycloneDX analysis state to a VEX status
fn map_state(state: Option<&str>) -> VexStatus {
    match state.map(str::trim) {
        Some("exploitable") => VexStatus::Affected,
        Some("false_positive" | "not_affected") => VexStatus::NotAffected,
        Some("resolved" | "resolved_with_pedigree") => VexStatus::Fixed,
        Some("in_triage") => VexStatus::UnderInvestigation,
        _ => VexStatus::Unknown,
    }
}

/// Map a CycloneDX analysis justification to its OpenVEX counterpart
fn map_justification(justification: &str) -> Option<VexJustification> {
    match justification.trim() {
        "code_not_present" => Some(VexJustification::VulnerableCodeNotPresent),
        "code_not_reachable" => Some(VexJustification::VulnerableCodeNotInExecutePath),
        "requires_configuration" | "requires_dependency" | "requires_environment" => {
            Some(VexJustification::VulnerableCodeCannotBeControlledByAdversary)
        }
        j if j.starts_with("protected_") => Some(VexJustification::InlineMitigationsAlreadyExist),
        _ => None,
    }
}

/// Products named by one `affects` entry.
///
/// A ref is a purl, or a BOM-link URN whose fragment is one. Listed versions
/// each yield the purl at that version. Anything else stays a bare bom-ref.
fn affected_products(affects: &CdxAffects) -> Vec<VexProduct> {
    let reference = affects.reference.trim();
    let purl_text = match reference.split_once('#') {
        Some((urn, fragment)) if urn.starts_with("urn:") && fragment.starts_with("pkg:") => fragment,
        _ => reference,
    };
    let Some(purl) = purl_text
        .starts_with("pkg:")
        .then(|| Purl::parse(purl_text).ok())
        .flatten()
    else {
        return vec![VexProduct::from_id(reference)];
    };

    let versioned: Vec<VexProduct> = affects
        .versions
        .iter()
        .filter_map(|v| non_empty(v.version.clone()))
        .filter_map(|v| purl.with_version(&v).ok())
        .map(|p| VexProduct {
            id: Some(reference.to_string()),
            purl: Some(p),
            subcomponents: Vec::new(),
        })
        .collect();
    if versioned.is_empty() {
        vec![VexProduct {
            id: Some(reference.to_string()),
            purl: Some(purl),
            subcomponents: Vec::new(),
        }]
    } else {
        versioned
    }
}

fn convert(vuln: CdxVulnerability) -> Option<VexStatement> {
    let analysis = vuln.analysis?;
    if vuln.affects.is_empty() {
        return None;
    }
    let Some(name) = non_empty(vuln.id).or(non_empty(vuln.bom_ref)) else {
        tracing::warn!("Skipping CycloneDX vulnerability without an id");
        return None;
    };

    let mut out = statement(name, map_state(analysis.state.as_deref()));
    out.aliases = vuln.references.into_iter().map(|r| r.id).collect();
    out.justification = analysis.justification.as_deref().and_then(map_justification);
    if !analysis.response.is_empty() {
        out.action_statement = Some(analysis.response.join("\n"));
    }
    out.status_notes = non_empty(analysis.detail);
    out.timestamp = vuln.updated.or(vuln.published);
    out.products = vuln.affects.iter().flat_map(affected_products).collect();
    Some(out)
}

/// Decode the vulnerabilities of a CycloneDX VEX BOM into statements.
pub(super) fn decode(content: &str) -> Result<Vec<VexStatement>, VexError> {
    let bom: CdxVexBom = serde_json::from_str(content)?;
    let total = bom.vulnerabilities.len();
    let statements: Vec<VexStatement> = bom.vulnerabilities.into_iter().filter_map(convert).collect();
    if statements.len() < total {
        tracing::debug!(
            "Skipped {} CycloneDX vulnerabilities without analysis or affects",
            total - statements.len()
        );
    }
    Ok(statements)
}
