//! Rendering and writing of command output.

use super::join_stage::Inventory;
use crate::config::OutputFormat;
use crate::join::JoinDiagnostic;
use crate::model::{Purl, Sbom};
use crate::scan::{ScanResults, Vulnerability};
use crate::vex::VexStatement;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Target for output - either stdout or a file
#[derive(Debug, Clone)]
pub enum OutputTarget {
    /// Write to stdout
    Stdout,
    /// Write to a file
    File(PathBuf),
}

impl OutputTarget {
    /// Create output target from optional path
    #[must_use]
    pub fn from_option(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => Self::File(p),
            None => Self::Stdout,
        }
    }
}

/// Write output to the target (stdout or file)
pub fn write_output(content: &str, target: &OutputTarget) -> Result<()> {
    match target {
        OutputTarget::Stdout => {
            println!("{content}");
            Ok(())
        }
        OutputTarget::File(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            tracing::info!("Output written to {}", path.display());
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct InventoryReport<'a> {
    #[serde(flatten)]
    sbom: &'a Sbom,
    #[serde(skip_serializing_if = "is_empty")]
    diagnostics: &'a [JoinDiagnostic],
    #[serde(skip_serializing_if = "is_empty")]
    failed_documents: &'a [String],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    vex: Vec<&'a VexStatement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scan: Option<&'a ScanResults>,
}

fn is_empty<T>(items: &&[T]) -> bool {
    items.is_empty()
}

/// Render an inventory, with scan results if there are any.
pub fn render_inventory(
    inventory: &Inventory,
    scan: Option<&ScanResults>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let report = InventoryReport {
                sbom: &inventory.sbom,
                diagnostics: &inventory.diagnostics,
                failed_documents: &inventory.failed_documents,
                vex: inventory.vex_statements().collect(),
                scan,
            };
            serde_json::to_string_pretty(&report).context("Failed to serialize inventory")
        }
        OutputFormat::Summary => Ok(render_summary(inventory, scan)),
    }
}

fn render_summary(inventory: &Inventory, scan: Option<&ScanResults>) -> String {
    let sbom = &inventory.sbom;
    let mut out = String::new();

    let _ = writeln!(out, "Inventory: {}", sbom.source);
    let _ = writeln!(out, "  Documents:   {}", inventory.documents.len());
    for doc in &inventory.documents {
        let _ = writeln!(
            out,
            "    {} ({}, {} packages)",
            doc.path.display(),
            doc.kind,
            doc.sbom.package_count()
        );
    }
    let _ = writeln!(out, "  Packages:    {}", sbom.package_count());
    let _ = writeln!(out, "  Edges:       {}", sbom.packages.edge_count());
    let _ = writeln!(out, "  Roots:       {}", join_purls(&sbom.root_packages));
    let _ = writeln!(out, "  Diagnostics: {}", inventory.diagnostics.len());
    for diagnostic in &inventory.diagnostics {
        let _ = writeln!(out, "    - {diagnostic}");
    }

    if !inventory.vex.is_empty() {
        let _ = writeln!(out, "  VEX statements: {}", inventory.vex_statements().count());
        for doc in &inventory.vex {
            let _ = writeln!(
                out,
                "    {} ({}, {} statements)",
                doc.source_path,
                doc.format,
                doc.statements.len()
            );
        }
    }

    if !inventory.failed_documents.is_empty() {
        let _ = writeln!(out, "  Failed documents: {}", inventory.failed_documents.len());
        for failure in &inventory.failed_documents {
            let _ = writeln!(out, "    - {failure}");
        }
    }

    if let Some(results) = scan {
        let _ = writeln!(out, "Vulnerabilities: {}", results.vulnerability_count());
        let suppressed = results.suppressed_count();
        if suppressed > 0 {
            let _ = writeln!(out, "  Suppressed by VEX: {suppressed}");
        }
        for package in results.vulnerable_packages() {
            let ids: Vec<String> = package.vulnerabilities.iter().map(finding_label).collect();
            let _ = writeln!(out, "  {}: {}", package.purl, ids.join(", "));
        }
        if !results.errors.is_empty() {
            let _ = writeln!(out, "  Scan errors: {}", results.errors.len());
        }
    }

    out.trim_end().to_string()
}

/// Finding ID, with the VEX status when one applies
fn finding_label(vuln: &Vulnerability) -> String {
    match &vuln.vex {
        Some(vex) => format!("{} [{}]", vuln.id, vex.status),
        None => vuln.id.clone(),
    }
}

fn join_purls(purls: &[Purl]) -> String {
    if purls.is_empty() {
        return "-".to_string();
    }
    purls.iter().map(Purl::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_inventory() -> Inventory {
        Inventory {
            sbom: Sbom::default(),
            diagnostics: Vec::new(),
            documents: Vec::new(),
            failed_documents: vec!["bad.json: unknown format".to_string()],
            vex: Vec::new(),
        }
    }

    #[test]
    fn test_output_target_from_option() {
        assert!(matches!(OutputTarget::from_option(None), OutputTarget::Stdout));
        let path = PathBuf::from("/tmp/out.json");
        assert!(matches!(OutputTarget::from_option(Some(path)), OutputTarget::File(_)));
    }

    #[test]
    fn test_render_json() {
        let json = render_inventory(&empty_inventory(), None, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["packages"], serde_json::json!([]));
        assert_eq!(value["failed_documents"][0], "bad.json: unknown format");
        assert!(value.get("scan").is_none());
        assert!(value.get("diagnostics").is_none());
    }

    #[test]
    fn test_render_summary() {
        let text = render_inventory(
            &empty_inventory(),
            Some(&ScanResults::empty()),
            OutputFormat::Summary,
        )
        .unwrap();
        assert!(text.contains("Packages:    0"));
        assert!(text.contains("Failed documents: 1"));
        assert!(text.contains("Vulnerabilities: 0"));
    }

    #[test]
    fn test_render_summary_marks_vex_status() {
        use crate::scan::{PackageScanResult, VexAssessment};
        use crate::vex::VexStatus;

        let mut results = ScanResults::empty();
        results.packages.push(PackageScanResult {
            purl: "pkg:pypi/jinja2@3.1.2".to_string(),
            name: "jinja2".to_string(),
            version: Some("3.1.2".to_string()),
            vulnerabilities: vec![Vulnerability {
                id: "GHSA-h5c8-rqwp-cp95".to_string(),
                summary: None,
                details: None,
                aliases: Vec::new(),
                severity: Vec::new(),
                published: None,
                modified: None,
                vex: Some(VexAssessment {
                    status: VexStatus::NotAffected,
                    justification: None,
                    source: "vendor.openvex.json".to_string(),
                }),
            }],
        });
        let text = render_inventory(&empty_inventory(), Some(&results), OutputFormat::Summary)
            .unwrap();
        assert!(text.contains("Suppressed by VEX: 1"), "{text}");
        assert!(text.contains("GHSA-h5c8-rqwp-cp95 [not_affected]"), "{text}");
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output("hello", &OutputTarget::File(path.clone())).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }
}
