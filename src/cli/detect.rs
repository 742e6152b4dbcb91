//! Detect command handler.

use crate::parsers::FormatDetector;
use crate::vex::detect_vex;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

/// Describe how a document would be decoded: the best content match and the
/// decoder candidates in the order they would be tried. VEX documents are
/// reported with their VEX format.
pub fn run_detect(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read SBOM file: {}", path.display()))?;

    let detector = FormatDetector::new();
    let detection = detector.detect_from_content(&content);
    let candidates = detector.candidates(Some(path), &content);

    let mut out = String::new();
    let _ = writeln!(out, "File: {}", path.display());
    match detection.kind {
        Some(kind) => {
            let _ = writeln!(
                out,
                "Detected: {kind} (confidence {:.2}{})",
                detection.confidence.value(),
                detection
                    .version
                    .as_deref()
                    .map(|v| format!(", version {v}"))
                    .unwrap_or_default()
            );
        }
        None => {
            let _ = writeln!(out, "Detected: unknown");
        }
    }
    if candidates.is_empty() {
        let _ = writeln!(out, "Candidates: none");
    } else {
        let names: Vec<String> = candidates.iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "Candidates: {}", names.join(", "));
    }
    if let Some(vex) = detect_vex(&content) {
        let _ = writeln!(out, "VEX: {vex}");
    }
    for warning in &detection.warnings {
        let _ = writeln!(out, "Warning: {warning}");
    }

    Ok(out.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_spdx_tag_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.spdx");
        std::fs::write(&path, "SPDXVersion: SPDX-2.3\nDataLicense: CC0-1.0\n").unwrap();
        let report = run_detect(&path).unwrap();
        assert!(report.contains("Candidates: "), "{report}");
        assert!(report.contains("SPDX"), "{report}");
    }

    #[test]
    fn test_detect_csaf_vex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("advisory.json");
        std::fs::write(&path, r#"{"document": {"category": "csaf_vex"}, "vulnerabilities": []}"#)
            .unwrap();
        let report = run_detect(&path).unwrap();
        assert!(report.contains("VEX: CSAF VEX"), "{report}");
    }

    #[test]
    fn test_detect_missing_file() {
        assert!(run_detect(Path::new("/nonexistent/doc.json")).is_err());
    }
}
