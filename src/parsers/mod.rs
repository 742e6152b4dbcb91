//! SBOM format decoders.
//!
//! This module turns CycloneDX, SPDX and Syft documents into package records
//! with dependency references, ready for [`crate::resolve`].
//!
//! ## Format Detection
//!
//! Detection yields an ordered list of [`DecoderKind`] candidates:
//! - A recognized filename suffix (`.cdx.json`, `.spdx`, `.syft.json`, ...) comes first
//! - Content sniffing follows, using top-level JSON fields where possible
//! - Each decoder also reports a confidence score (0.0-1.0) for ranking the rest
//!
//! The first candidate that accepts the document decodes it.
//!
//! ## Usage
//!
//! ```no_run
//! use sbom_join::parsers::{decode_file, detect_format, MAX_SBOM_FILE_SIZE};
//! use std::path::Path;
//!
//! // Auto-detect and decode
//! let (kind, decoded) = decode_file(Path::new("bom.cdx.json"), MAX_SBOM_FILE_SIZE).unwrap();
//! println!("{kind}: {} packages", decoded.records.len());
//!
//! // Check format before decoding
//! let content = std::fs::read_to_string("bom.cdx.json").unwrap();
//! if let Some(kind) = detect_format(&content).kind {
//!     println!("Detected: {kind}");
//! }
//! ```

mod cyclonedx;
mod detection;
mod spdx;
mod syft;
mod traits;

pub use cyclonedx::CycloneDxDecoder;
pub use detection::{DecoderKind, DetectionResult, FormatDetector, MIN_CONFIDENCE_THRESHOLD};
pub use spdx::SpdxDecoder;
pub use syft::SyftDecoder;
pub use traits::{Decoded, FormatConfidence, FormatDetection, ParseError, SbomDecoder};

use crate::model::{Identifier, IdentifierType};
use std::path::Path;

/// Default maximum document size (512 MB).
pub const MAX_SBOM_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Detect the most likely format from content without decoding
#[must_use]
pub fn detect_format(content: &str) -> DetectionResult {
    FormatDetector::new().detect_from_content(content)
}

/// Read and decode a document, applying the partial-success rule.
///
/// Returns an error if the file exceeds `max_size` bytes to prevent OOM.
pub fn decode_file(path: &Path, max_size: u64) -> Result<(DecoderKind, Decoded), ParseError> {
    let metadata = std::fs::metadata(path)?;
    if metadata.len() > max_size {
        return Err(ParseError::IoError(format!(
            "{} is {} MB, exceeding the {} MB limit",
            path.display(),
            metadata.len() / (1024 * 1024),
            max_size / (1024 * 1024),
        )));
    }
    let content = std::fs::read_to_string(path)?;
    let source_path = path.display().to_string();
    let (kind, decoded) = FormatDetector::new().decode(Some(path), &content, &source_path)?;
    Ok((kind, decoded.into_result(&source_path)?))
}

/// Decode a document held in memory, applying the partial-success rule.
pub fn decode_str(content: &str, source_path: &str) -> Result<(DecoderKind, Decoded), ParseError> {
    let (kind, decoded) =
        FormatDetector::new().decode(Some(Path::new(source_path)), content, source_path)?;
    Ok((kind, decoded.into_result(source_path)?))
}

/// Non-empty and not an SPDX placeholder
pub(crate) fn has_value(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && !value.eq_ignore_ascii_case("NOASSERTION")
        && !value.eq_ignore_ascii_case("NONE")
}

/// Build a digest identifier with a normalized algorithm tag.
///
/// `SHA256`, `sha-256` and `SHA_256` all become `sha-256`, so hashes from
/// different formats compare equal.
pub(crate) fn digest_identifier(algorithm: &str, value: &str) -> Identifier {
    let lower = algorithm.trim().to_ascii_lowercase();
    let compact = lower.replace(['-', '_'], "");
    let is_sha = !lower.starts_with("sha3")
        && compact
            .strip_prefix("sha")
            .is_some_and(|bits| !bits.is_empty() && bits.chars().all(|c| c.is_ascii_digit()));
    let tag = if is_sha {
        format!("sha-{}", &compact[3..])
    } else {
        compact
    };
    let id_type = match tag.as_str() {
        "sha-1" => IdentifierType::SHA1,
        "sha-256" => IdentifierType::SHA256,
        _ => IdentifierType::new(tag),
    };
    Identifier::new(id_type, value.trim())
}

/// First string value of `"key": "..."` in JSON text (quick heuristic)
pub(crate) fn extract_json_string(content: &str, key: &str) -> Option<String> {
    let needle = format!("\"{key}\"");
    let after = &content[content.find(&needle)? + needle.len()..];
    let value = after.trim_start().strip_prefix(':')?.trim_start();
    let value = value.strip_prefix('"')?;
    Some(value[..value.find('"')?].to_string())
}
