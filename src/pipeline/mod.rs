//! Pipeline orchestration for inventory commands.
//!
//! Shared load → resolve → join → scan → output steps used by the CLI
//! command handlers.

mod join_stage;
mod output;
mod parse;
mod scan_stage;

pub use join_stage::{build_inventory, Inventory, InventoryInputs};
pub use output::{render_inventory, write_output, OutputTarget};
pub use parse::{load_document, load_documents, LoadedDocument};
pub use scan_stage::{build_scanner, scan_inventory};

use crate::error::SbomError;
use crate::parsers::ParseError;

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to read or decode an SBOM file
    #[error("Parse failed for {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: ParseError,
    },

    /// No input paths were given
    #[error("No input documents given; pass --declared and/or --discovered")]
    NoInputs,

    /// Every input document failed to load
    #[error("None of the input documents could be loaded: {}", .failures.join("; "))]
    NoDocuments { failures: Vec<String> },

    /// Vulnerability scan failed
    #[error("Scan failed: {source}")]
    ScanFailed {
        #[source]
        source: SbomError,
    },
}
