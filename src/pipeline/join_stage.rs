//! Inventory assembly: load both evidence classes and join them.

use super::parse::{load_documents, LoadedDocument};
use super::PipelineError;
use crate::config::AppConfig;
use crate::join::{join_sboms_with, JoinDiagnostic};
use crate::model::Sbom;
use crate::vex::{decode_vex_file, VexDocument, VexStatement};
use std::path::PathBuf;

/// Input documents grouped by evidence class
#[derive(Debug, Clone, Default)]
pub struct InventoryInputs {
    pub declared: Vec<PathBuf>,
    pub discovered: Vec<PathBuf>,
    /// VEX documents to apply to scan results
    pub vex: Vec<PathBuf>,
}

impl InventoryInputs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty() && self.discovered.is_empty()
    }
}

/// A joined inventory plus what happened on the way
#[derive(Debug, Clone)]
pub struct Inventory {
    pub sbom: Sbom,
    pub diagnostics: Vec<JoinDiagnostic>,
    pub documents: Vec<LoadedDocument>,
    /// Documents that could not be loaded, as messages
    pub failed_documents: Vec<String>,
    pub vex: Vec<VexDocument>,
}

impl Inventory {
    /// Statements of all VEX documents, in input order
    pub fn vex_statements(&self) -> impl Iterator<Item = &VexStatement> {
        self.vex.iter().flat_map(|doc| &doc.statements)
    }
}

/// Load, resolve and join all inputs.
///
/// Fails only when no document at all could be loaded.
pub fn build_inventory(inputs: &InventoryInputs, config: &AppConfig) -> Result<Inventory, PipelineError> {
    if inputs.is_empty() {
        return Err(PipelineError::NoInputs);
    }

    let (declared, mut failed) = load_documents(&inputs.declared, &config.input);
    let (discovered, discovery_failed) = load_documents(&inputs.discovered, &config.input);
    failed.extend(discovery_failed);

    if declared.is_empty() && discovered.is_empty() {
        return Err(PipelineError::NoDocuments {
            failures: failed.iter().map(ToString::to_string).collect(),
        });
    }

    let declared_sboms: Vec<Sbom> = declared.iter().map(|d| d.sbom.clone()).collect();
    let discovered_sboms: Vec<Sbom> = discovered.iter().map(|d| d.sbom.clone()).collect();
    let outcome = join_sboms_with(&declared_sboms, &discovered_sboms, &config.join);

    let mut failed_documents: Vec<String> = failed.iter().map(ToString::to_string).collect();
    let mut vex = Vec::with_capacity(inputs.vex.len());
    for path in &inputs.vex {
        tracing::info!("Loading VEX: {}", path.display());
        match decode_vex_file(path, config.input.max_file_size_bytes(), None) {
            Ok(doc) => vex.push(doc),
            Err(err) => {
                tracing::warn!("Skipping VEX document {}: {}", path.display(), err);
                failed_documents.push(format!("{}: {err}", path.display()));
            }
        }
    }

    Ok(Inventory {
        sbom: outcome.sbom,
        diagnostics: outcome.diagnostics,
        documents: declared.into_iter().chain(discovered).collect(),
        failed_documents,
        vex,
    })
}
