//! Document loading.
//!
//! Reads, detects, decodes and resolves one document per path. A document
//! that cannot be loaded is logged and reported, and the rest proceed.

use super::PipelineError;
use crate::config::InputConfig;
use crate::model::Sbom;
use crate::parsers::{decode_file, DecoderKind};
use std::path::{Path, PathBuf};

/// One decoded and resolved document
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub kind: DecoderKind,
    pub sbom: Sbom,
    /// Records the decoder or resolver had to skip
    pub warnings: Vec<String>,
}

/// Load and resolve a single document.
pub fn load_document(path: &Path, input: &InputConfig) -> Result<LoadedDocument, PipelineError> {
    tracing::info!("Loading SBOM: {}", path.display());

    let (kind, decoded) =
        decode_file(path, input.max_file_size_bytes()).map_err(|source| {
            PipelineError::ParseFailed {
                path: path.display().to_string(),
                source,
            }
        })?;

    let mut warnings = decoded.errors;
    let (sbom, resolve_error) = Sbom::from_records(path.display().to_string(), &decoded.records);
    if let Some(err) = resolve_error {
        warnings.extend(err.errors.iter().map(ToString::to_string));
    }

    for warning in &warnings {
        tracing::warn!("{}: {}", path.display(), warning);
    }
    tracing::info!(
        "Loaded {} as {}: {} packages, {} edges",
        path.display(),
        kind,
        sbom.package_count(),
        sbom.packages.edge_count()
    );

    Ok(LoadedDocument {
        path: path.to_path_buf(),
        kind,
        sbom,
        warnings,
    })
}

/// Load every document, keeping the ones that succeed.
///
/// Failures are returned alongside, in input order.
pub fn load_documents(
    paths: &[PathBuf],
    input: &InputConfig,
) -> (Vec<LoadedDocument>, Vec<PipelineError>) {
    let mut loaded = Vec::with_capacity(paths.len());
    let mut failed = Vec::new();
    for path in paths {
        match load_document(path, input) {
            Ok(doc) => loaded.push(doc),
            Err(err) => {
                tracing::warn!("Skipping document: {}", err);
                failed.push(err);
            }
        }
    }
    (loaded, failed)
}
