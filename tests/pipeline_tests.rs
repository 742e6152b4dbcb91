//! Pipeline and CLI integration tests.
//!
//! These tests exercise the full load → resolve → join → output pipeline,
//! error handling paths, and CLI command handlers with real fixture files.

use sbom_join::config::{AppConfig, OutputFormat};
use sbom_join::parsers::DecoderKind;
use sbom_join::pipeline::{
    build_inventory, load_document, render_inventory, InventoryInputs, PipelineError,
};
use sbom_join::{cli, JoinDiagnostic};
use std::path::{Path, PathBuf};

// ============================================================================
// Test Fixtures
// ============================================================================

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> PathBuf {
    Path::new(FIXTURES_DIR).join(name)
}

fn purls(inventory: &sbom_join::pipeline::Inventory) -> Vec<String> {
    inventory
        .sbom
        .packages
        .iter()
        .map(|(_, p)| p.info.key().to_string())
        .collect()
}

// ============================================================================
// Load Stage Tests
// ============================================================================

mod load_stage {
    use super::*;

    #[test]
    fn load_cyclonedx_fixture() {
        let doc = load_document(&fixture_path("cyclonedx/app.cdx.json"), &Default::default())
            .expect("load should succeed");
        assert_eq!(doc.kind, DecoderKind::CycloneDxJson);
        assert_eq!(doc.sbom.package_count(), 5);
        // flask's reference to click points outside the document
        assert_eq!(doc.sbom.packages.edge_count(), 5);
        assert_eq!(doc.sbom.root_packages.len(), 1);
        assert_eq!(doc.sbom.root_packages[0].as_str(), "pkg:pypi/webapp@0.1.0");
    }

    #[test]
    fn load_spdx_json_fixture() {
        let doc = load_document(&fixture_path("spdx/app.spdx.json"), &Default::default())
            .expect("load should succeed");
        assert_eq!(doc.kind, DecoderKind::SpdxJson);
        assert_eq!(doc.sbom.package_count(), 4);
        assert_eq!(doc.sbom.packages.edge_count(), 3);
        assert!(doc
            .sbom
            .packages
            .find_by_purl("pkg:internal/internal/vendored-helper@0.0.1")
            .is_some());
    }

    #[test]
    fn load_missing_file_fails() {
        let err = load_document(Path::new("/nonexistent/sbom.json"), &Default::default())
            .unwrap_err();
        assert!(matches!(err, PipelineError::ParseFailed { .. }));
    }
}

// ============================================================================
// Join Stage Tests
// ============================================================================

mod join_stage {
    use super::*;

    fn webapp_inventory() -> sbom_join::pipeline::Inventory {
        let inputs = InventoryInputs {
            declared: vec![fixture_path("cyclonedx/app.cdx.json")],
            discovered: vec![fixture_path("syft/image.syft.json")],
            vex: Vec::new(),
        };
        build_inventory(&inputs, &AppConfig::default()).expect("inventory")
    }

    #[test]
    fn declared_and_discovered_are_joined() {
        let inventory = webapp_inventory();
        assert_eq!(
            purls(&inventory),
            [
                "pkg:pypi/webapp@0.1.0",
                "pkg:pypi/flask@3.0.0",
                "pkg:pypi/werkzeug@3.0.1",
                "pkg:pypi/jinja2@3.1.2",
                "pkg:pypi/markupsafe@2.1.3",
                "pkg:pypi/markupsafe@2.1.3",
                "pkg:deb/debian/python3.11@3.11.2-6",
                "pkg:deb/debian/openssl@3.0.11",
            ]
        );

        let roots: Vec<&str> = inventory
            .sbom
            .root_packages
            .iter()
            .map(|p| p.as_str())
            .collect();
        assert_eq!(
            roots,
            [
                "pkg:pypi/webapp@0.1.0",
                "pkg:pypi/markupsafe@2.1.3",
                "pkg:deb/debian/python3.11@3.11.2-6"
            ]
        );
    }

    #[test]
    fn same_purl_records_are_merged() {
        let inventory = webapp_inventory();
        let flask = inventory
            .sbom
            .packages
            .find_by_purl("pkg:pypi/flask@3.0.0")
            .expect("flask present");
        let info = &inventory.sbom.packages[flask].info;
        assert_eq!(info.licenses, ["BSD-3-Clause", "MIT"]);
        assert_eq!(info.locations.len(), 2);
        assert!(info.locations.contains(&"pkg:pypi/flask@3.0.0".to_string()));
        assert!(info.source.is_none());
    }

    #[test]
    fn conflicts_and_skips_are_diagnosed() {
        let inventory = webapp_inventory();
        assert_eq!(inventory.diagnostics.len(), 2);
        assert!(matches!(
            inventory.diagnostics[0],
            JoinDiagnostic::MergeConflict { .. }
        ));

        // The conflicting scanner record is kept next to the declared one.
        let names: Vec<&str> = inventory
            .sbom
            .packages
            .iter()
            .filter(|(_, p)| p.info.purl.as_str() == "pkg:pypi/markupsafe@2.1.3")
            .map(|(_, p)| p.info.name.as_str())
            .collect();
        assert_eq!(names, ["markupsafe", "MarkupSafe"]);
        assert!(matches!(
            inventory.diagnostics[1],
            JoinDiagnostic::SkippedUnknownVersion { .. }
        ));
    }

    #[test]
    fn failed_document_does_not_stop_the_join() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.cdx.json");
        std::fs::write(&broken, "{ this is not json").unwrap();

        let inputs = InventoryInputs {
            declared: vec![broken, fixture_path("spdx/app.spdx")],
            discovered: vec![fixture_path("cyclonedx/app.cdx.xml")],
            vex: Vec::new(),
        };
        let inventory = build_inventory(&inputs, &AppConfig::default()).expect("inventory");
        assert_eq!(inventory.failed_documents.len(), 1);
        assert_eq!(inventory.documents.len(), 2);
        assert_eq!(inventory.sbom.package_count(), 4);
    }

    #[test]
    fn oversized_document_is_rejected() {
        let config = AppConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let big = dir.path().join("big.cdx.json");
        let file = std::fs::File::create(&big).unwrap();
        file.set_len(config.input.max_file_size_bytes() + 1).unwrap();

        let inputs = InventoryInputs {
            declared: vec![big],
            discovered: Vec::new(),
            vex: Vec::new(),
        };
        let err = build_inventory(&inputs, &config).unwrap_err();
        assert!(err.to_string().contains("exceeding"), "{err}");
    }
}

// ============================================================================
// Output and CLI Handler Tests
// ============================================================================

mod output {
    use super::*;

    #[test]
    fn json_output_lists_packages_and_diagnostics() {
        let inputs = InventoryInputs {
            declared: vec![fixture_path("cyclonedx/app.cdx.json")],
            discovered: vec![fixture_path("syft/image.syft.json")],
            vex: Vec::new(),
        };
        let inventory = build_inventory(&inputs, &AppConfig::default()).unwrap();
        let json = render_inventory(&inventory, None, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["packages"].as_array().map(Vec::len), Some(8));
        assert_eq!(value["diagnostics"][0]["kind"], "merge_conflict");
        assert_eq!(value["root_packages"][0], "pkg:pypi/webapp@0.1.0");
    }

    #[test]
    fn summary_output_mentions_counts() {
        let inputs = InventoryInputs {
            declared: vec![fixture_path("spdx/app.spdx.json")],
            discovered: Vec::new(),
            vex: Vec::new(),
        };
        let inventory = build_inventory(&inputs, &AppConfig::default()).unwrap();
        let text = render_inventory(&inventory, None, OutputFormat::Summary).unwrap();
        assert!(text.contains("Packages:    4"), "{text}");
        assert!(text.contains("SPDX JSON"), "{text}");
    }

    #[test]
    fn run_inventory_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("joined.json");
        let config = AppConfig::builder()
            .output_file(Some(out.clone()))
            .build();
        let inputs = InventoryInputs {
            declared: vec![fixture_path("cyclonedx/app.cdx.xml")],
            discovered: Vec::new(),
            vex: Vec::new(),
        };
        cli::run_inventory(&inputs, &config).expect("inventory command");
        let content = std::fs::read_to_string(out).unwrap();
        assert!(content.contains("pkg:npm/express@4.18.2"));
    }

    #[test]
    fn run_detect_reports_candidates() {
        let report = cli::run_detect(&fixture_path("syft/image.syft.json")).unwrap();
        assert!(report.contains("Detected: Syft JSON"), "{report}");
        assert!(report.contains("Candidates: Syft JSON"), "{report}");
    }
}
