//! Decoder trait definitions and error types.
//!
//! This module defines the `SbomDecoder` trait for format-specific decoders
//! and the confidence scoring used to pick between them.

use crate::model::PackageWithDependencyRefs;
use thiserror::Error;

/// Errors that can occur while decoding a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("JSON parse error: {0}")]
    JsonError(String),

    #[error("XML parse error: {0}")]
    XmlError(String),

    #[error("YAML parse error: {0}")]
    YamlError(String),

    #[error("Invalid SBOM structure: {0}")]
    InvalidStructure(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown SBOM format: {0}")]
    UnknownFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid package URL: {0}")]
    InvalidPurl(String),

    /// Every package of the document failed to convert
    #[error("{source_path}: no usable packages ({} conversion error(s): {})", .errors.len(), .errors.join("; "))]
    Document {
        source_path: String,
        errors: Vec<String>,
    },
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ParseError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

impl From<quick_xml::DeError> for ParseError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::XmlError(err.to_string())
    }
}

/// Decoder output: usable records plus per-package conversion failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub records: Vec<PackageWithDependencyRefs>,
    pub errors: Vec<String>,
}

impl Decoded {
    /// Apply the per-document partial-success rule.
    ///
    /// A document fails only when it produced no records and at least one
    /// conversion error; otherwise errors are carried along as warnings.
    pub fn into_result(self, source_path: &str) -> Result<Self, ParseError> {
        if self.records.is_empty() && !self.errors.is_empty() {
            return Err(ParseError::Document {
                source_path: source_path.to_string(),
                errors: self.errors,
            });
        }
        Ok(self)
    }

    /// Record a conversion failure
    pub fn push_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }
}

/// Confidence level for format detection
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FormatConfidence(f32);

impl FormatConfidence {
    /// No confidence - definitely not this format
    pub const NONE: Self = Self(0.0);
    /// Low confidence - might be this format
    pub const LOW: Self = Self(0.25);
    /// Medium confidence - likely this format
    pub const MEDIUM: Self = Self(0.5);
    /// High confidence - almost certainly this format
    pub const HIGH: Self = Self(0.75);
    /// Certain - definitely this format
    pub const CERTAIN: Self = Self(1.0);

    /// Get the confidence value
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }

    /// Check if this confidence indicates the format can be decoded
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.0 >= Self::LOW.0
    }
}

/// Detection result from a decoder
#[derive(Debug, Clone)]
pub struct FormatDetection {
    /// Confidence that this decoder can handle the content
    pub confidence: FormatConfidence,
    /// Detected encoding variant (e.g., "JSON", "XML", "tag-value")
    pub variant: Option<String>,
    /// Detected version if applicable
    pub version: Option<String>,
    /// Any issues detected that might affect decoding
    pub warnings: Vec<String>,
}

impl FormatDetection {
    /// Create a detection result indicating no match
    #[must_use]
    pub const fn no_match() -> Self {
        Self::with_confidence(FormatConfidence::NONE)
    }

    /// Create a detection result with confidence
    #[must_use]
    pub const fn with_confidence(confidence: FormatConfidence) -> Self {
        Self {
            confidence,
            variant: None,
            version: None,
            warnings: Vec::new(),
        }
    }

    /// Set the detected variant
    #[must_use]
    pub fn variant(mut self, variant: &str) -> Self {
        self.variant = Some(variant.to_string());
        self
    }

    /// Set the detected version, if any
    #[must_use]
    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Add a warning
    #[must_use]
    pub fn warning(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }
}

/// Trait for SBOM format decoders.
///
/// A decoder turns one document into package records with dependency
/// references. `detect()` gives a cheap structural guess so the detector can
/// order candidates without trial decoding.
pub trait SbomDecoder {
    /// Decode a document, choosing the encoding from its content
    fn decode(&self, content: &str, source_path: &str) -> Result<Decoded, ParseError>;

    /// Get supported format versions
    fn supported_versions(&self) -> Vec<&str>;

    /// Get format name
    fn format_name(&self) -> &str;

    /// Detect if this decoder can handle the given content
    fn detect(&self, content: &str) -> FormatDetection;

    /// Quick check if this decoder can likely handle the content
    fn can_decode(&self, content: &str) -> bool {
        self.detect(content).confidence.can_parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawPackage;

    #[test]
    fn test_partial_success_rule() {
        let empty = Decoded::default();
        assert!(empty.into_result("a.json").is_ok());

        let mut failed = Decoded::default();
        failed.push_error("component x: bad purl");
        let err = failed.into_result("a.json").unwrap_err();
        assert!(matches!(err, ParseError::Document { ref errors, .. } if errors.len() == 1));

        let mut partial = Decoded::default();
        partial.push_error("component x: bad purl");
        partial
            .records
            .push(PackageWithDependencyRefs::new(RawPackage::new("y", "pkg:npm/y@1")));
        let ok = partial.into_result("a.json").expect("partial success");
        assert_eq!(ok.errors.len(), 1);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(FormatConfidence::HIGH > FormatConfidence::MEDIUM);
        assert!(FormatConfidence::LOW.can_parse());
        assert!(!FormatConfidence::NONE.can_parse());
    }
}
