//! Format detection for SBOM documents.
//!
//! Detection produces an ordered list of decoder candidates: the filename
//! suffix first, then what the content itself looks like. Decoding tries the
//! candidates in order and keeps the first one that accepts the document.

use super::traits::{Decoded, FormatConfidence, FormatDetection, ParseError, SbomDecoder};
use super::{CycloneDxDecoder, SpdxDecoder, SyftDecoder};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Minimum confidence threshold for accepting a format detection.
/// This is LOW confidence (0.25) - the decoder believes it might handle the content.
pub const MIN_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// A concrete format and encoding a document can be decoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    CycloneDxJson,
    CycloneDxXml,
    SpdxJson,
    SpdxTagValue,
    SpdxYaml,
    SyftJson,
}

impl DecoderKind {
    /// Filename suffixes, longest first where they overlap
    const SUFFIXES: [(&'static str, Self); 7] = [
        (".cdx.json", Self::CycloneDxJson),
        (".cdx.xml", Self::CycloneDxXml),
        (".spdx.json", Self::SpdxJson),
        (".spdx.yaml", Self::SpdxYaml),
        (".spdx.yml", Self::SpdxYaml),
        (".spdx", Self::SpdxTagValue),
        (".syft.json", Self::SyftJson),
    ];

    /// Human-readable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CycloneDxJson => "CycloneDX JSON",
            Self::CycloneDxXml => "CycloneDX XML",
            Self::SpdxJson => "SPDX JSON",
            Self::SpdxTagValue => "SPDX tag-value",
            Self::SpdxYaml => "SPDX YAML",
            Self::SyftJson => "Syft JSON",
        }
    }

    /// Decoder implied by the file name, if any
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        Self::SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|&(_, kind)| kind)
    }

    /// Decode `content` with this decoder
    pub fn decode(self, content: &str, source_path: &str) -> Result<Decoded, ParseError> {
        match self {
            Self::CycloneDxJson => CycloneDxDecoder::new().decode_json(content, source_path),
            Self::CycloneDxXml => CycloneDxDecoder::new().decode_xml(content, source_path),
            Self::SpdxJson => SpdxDecoder::new().decode_json(content, source_path),
            Self::SpdxTagValue => SpdxDecoder::new().decode_tag_value(content, source_path),
            Self::SpdxYaml => SpdxDecoder::new().decode_yaml(content, source_path),
            Self::SyftJson => SyftDecoder::new().decode(content, source_path),
        }
    }

    fn from_detection(format: &str, detection: &FormatDetection) -> Option<Self> {
        match (format, detection.variant.as_deref()) {
            ("CycloneDX", Some("XML")) => Some(Self::CycloneDxXml),
            ("CycloneDX", _) => Some(Self::CycloneDxJson),
            ("SPDX", Some("tag-value")) => Some(Self::SpdxTagValue),
            ("SPDX", Some("YAML")) => Some(Self::SpdxYaml),
            ("SPDX", Some("JSON")) => Some(Self::SpdxJson),
            ("Syft", _) => Some(Self::SyftJson),
            _ => None,
        }
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of confidence-based detection.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// The decoder that should handle this content, if detected.
    pub kind: Option<DecoderKind>,
    /// Confidence level of the detection.
    pub confidence: FormatConfidence,
    /// Detected version if available.
    pub version: Option<String>,
    /// Any warnings about the detection.
    pub warnings: Vec<String>,
}

impl DetectionResult {
    /// Create a result indicating no format was detected.
    #[must_use]
    pub fn unknown(reason: &str) -> Self {
        Self {
            kind: None,
            confidence: FormatConfidence::NONE,
            version: None,
            warnings: vec![reason.to_string()],
        }
    }

    /// Check if the detection is confident enough to decode.
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.kind.is_some() && self.confidence.value() >= MIN_CONFIDENCE_THRESHOLD
    }
}

/// Top-level fields that identify a JSON document's format
#[derive(Debug, Default, Deserialize)]
struct JsonEnvelope {
    #[serde(rename = "bomFormat")]
    bom_format: Option<String>,
    #[serde(rename = "spdxVersion")]
    spdx_version: Option<String>,
    #[serde(rename = "@context")]
    context: Option<serde_json::Value>,
    schema: Option<EnvelopeSchema>,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeSchema {
    url: Option<String>,
}

impl JsonEnvelope {
    fn kinds(&self) -> Vec<DecoderKind> {
        let mut kinds = Vec::new();
        if self.bom_format.as_deref() == Some("CycloneDX") {
            kinds.push(DecoderKind::CycloneDxJson);
        }
        let spdx_context = match &self.context {
            Some(serde_json::Value::String(ctx)) => ctx.starts_with("https://spdx.org/"),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(serde_json::Value::as_str)
                .any(|ctx| ctx.starts_with("https://spdx.org/")),
            _ => false,
        };
        if self.spdx_version.as_deref().is_some_and(|v| !v.is_empty()) || spdx_context {
            kinds.push(DecoderKind::SpdxJson);
        }
        if self
            .schema
            .as_ref()
            .and_then(|s| s.url.as_deref())
            .is_some_and(|url| url.contains("anchore/syft"))
        {
            kinds.push(DecoderKind::SyftJson);
        }
        kinds
    }
}

/// Format detector over all supported decoders.
#[derive(Debug, Clone)]
pub struct FormatDetector {
    cyclonedx: CycloneDxDecoder,
    spdx: SpdxDecoder,
    syft: SyftDecoder,
    min_confidence: f32,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatDetector {
    /// Create a new format detector with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cyclonedx: CycloneDxDecoder::new(),
            spdx: SpdxDecoder::new(),
            syft: SyftDecoder::new(),
            min_confidence: MIN_CONFIDENCE_THRESHOLD,
        }
    }

    /// Create a format detector with a custom confidence threshold.
    #[must_use]
    pub fn with_threshold(min_confidence: f32) -> Self {
        Self {
            min_confidence: min_confidence.clamp(0.0, 1.0),
            ..Self::new()
        }
    }

    fn decoders(&self) -> [&dyn SbomDecoder; 3] {
        [&self.cyclonedx, &self.spdx, &self.syft]
    }

    /// Confidence-ranked guesses from each decoder's `detect()`, best first
    fn ranked(&self, content: &str) -> Vec<(DecoderKind, FormatDetection)> {
        let mut ranked: Vec<(DecoderKind, FormatDetection)> = self
            .decoders()
            .into_iter()
            .filter_map(|decoder| {
                let detection = decoder.detect(content);
                tracing::debug!(
                    "Format detection: {}={:.2}, threshold={:.2}",
                    decoder.format_name(),
                    detection.confidence.value(),
                    self.min_confidence
                );
                if detection.confidence.value() < self.min_confidence {
                    return None;
                }
                DecoderKind::from_detection(decoder.format_name(), &detection)
                    .map(|kind| (kind, detection))
            })
            .collect();
        // Stable sort keeps decoder order for equal confidence
        ranked.sort_by(|a, b| b.1.confidence.value().total_cmp(&a.1.confidence.value()));
        ranked
    }

    /// Detect the most likely format from content.
    #[must_use]
    pub fn detect_from_content(&self, content: &str) -> DetectionResult {
        match self.ranked(content).into_iter().next() {
            Some((kind, detection)) => DetectionResult {
                kind: Some(kind),
                confidence: detection.confidence,
                version: detection.version,
                warnings: detection.warnings,
            },
            None => DetectionResult::unknown("Could not detect SBOM format with sufficient confidence"),
        }
    }

    /// Ordered decoder candidates for a document.
    ///
    /// The filename suffix wins, then content sniffing: `<` means CycloneDX
    /// XML, `{` or `[` means JSON envelope inspection followed by the
    /// confidence ranking, anything else is SPDX tag-value or YAML.
    #[must_use]
    pub fn candidates(&self, path: Option<&Path>, content: &str) -> Vec<DecoderKind> {
        let mut candidates = Vec::new();
        if let Some(kind) = path.and_then(DecoderKind::from_path) {
            candidates.push(kind);
        }

        let trimmed = content.trim_start();
        match trimmed.chars().next() {
            Some('<') => {
                if content.contains("spdx.org/rdf") {
                    tracing::warn!("SPDX RDF/XML documents are not supported");
                } else {
                    candidates.push(DecoderKind::CycloneDxXml);
                }
            }
            Some('{' | '[') => {
                let envelope: JsonEnvelope = serde_json::from_str(content).unwrap_or_default();
                candidates.extend(envelope.kinds());
                candidates.extend(self.ranked(content).into_iter().map(|(kind, _)| kind));
            }
            Some(_) => {
                if trimmed.starts_with("SPDXVersion:") || trimmed.contains("\nSPDXVersion:") {
                    candidates.push(DecoderKind::SpdxTagValue);
                } else {
                    candidates.push(DecoderKind::SpdxYaml);
                }
            }
            None => {}
        }

        let mut seen = Vec::with_capacity(candidates.len());
        candidates.retain(|kind| {
            if seen.contains(kind) {
                false
            } else {
                seen.push(*kind);
                true
            }
        });
        tracing::debug!(?candidates, "Decoder candidates");
        candidates
    }

    /// Decode a document with the first candidate that accepts it.
    pub fn decode(
        &self,
        path: Option<&Path>,
        content: &str,
        source_path: &str,
    ) -> Result<(DecoderKind, Decoded), ParseError> {
        let candidates = self.candidates(path, content);
        let mut failures = Vec::new();

        for kind in candidates {
            match kind.decode(content, source_path) {
                Ok(decoded) => {
                    tracing::debug!(decoder = %kind, source = source_path, "Decoded document");
                    return Ok((kind, decoded));
                }
                Err(e) => {
                    tracing::debug!(decoder = %kind, error = %e, "Decoder rejected document");
                    failures.push(format!("{kind}: {e}"));
                }
            }
        }

        let reason = if failures.is_empty() {
            format!("{source_path}: expected CycloneDX, SPDX or Syft")
        } else {
            format!("{source_path}: {}", failures.join("; "))
        };
        Err(ParseError::UnknownFormat(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_hint() {
        let cases = [
            ("app.cdx.json", DecoderKind::CycloneDxJson),
            ("APP.CDX.XML", DecoderKind::CycloneDxXml),
            ("dir/app.spdx.json", DecoderKind::SpdxJson),
            ("app.spdx", DecoderKind::SpdxTagValue),
            ("app.spdx.yml", DecoderKind::SpdxYaml),
            ("image.syft.json", DecoderKind::SyftJson),
        ];
        for (name, kind) in cases {
            assert_eq!(DecoderKind::from_path(Path::new(name)), Some(kind), "{name}");
        }
        assert_eq!(DecoderKind::from_path(Path::new("bom.json")), None);
    }

    #[test]
    fn test_detect_cyclonedx_json() {
        let detector = FormatDetector::new();
        let content = r#"{"bomFormat": "CycloneDX", "specVersion": "1.5"}"#;
        let result = detector.detect_from_content(content);

        assert_eq!(result.kind, Some(DecoderKind::CycloneDxJson));
        assert!(result.can_parse());
        assert_eq!(result.version.as_deref(), Some("1.5"));
    }

    #[test]
    fn test_detect_unknown_format() {
        let detector = FormatDetector::new();
        let result = detector.detect_from_content(r#"{"some": "random", "json": "content"}"#);

        assert!(result.kind.is_none());
        assert!(!result.can_parse());
    }

    #[test]
    fn test_candidates_envelope() {
        let detector = FormatDetector::new();
        let spdx = r#"{"spdxVersion": "SPDX-2.3", "SPDXID": "SPDXRef-DOCUMENT"}"#;
        assert_eq!(detector.candidates(None, spdx), vec![DecoderKind::SpdxJson]);

        let syft = r#"{"artifacts": [], "schema": {"url": "https://raw.githubusercontent.com/anchore/syft/main/schema/json/schema-16.0.0.json"}}"#;
        assert_eq!(detector.candidates(None, syft)[0], DecoderKind::SyftJson);
    }

    #[test]
    fn test_candidates_hint_first() {
        let detector = FormatDetector::new();
        let spdx = r#"{"spdxVersion": "SPDX-2.3", "SPDXID": "SPDXRef-DOCUMENT"}"#;
        let candidates = detector.candidates(Some(Path::new("odd.cdx.json")), spdx);
        assert_eq!(
            candidates,
            vec![DecoderKind::CycloneDxJson, DecoderKind::SpdxJson]
        );
    }

    #[test]
    fn test_candidates_text() {
        let detector = FormatDetector::new();
        assert_eq!(
            detector.candidates(None, "SPDXVersion: SPDX-2.3\n"),
            vec![DecoderKind::SpdxTagValue]
        );
        assert_eq!(
            detector.candidates(None, "spdxVersion: SPDX-2.3\n"),
            vec![DecoderKind::SpdxYaml]
        );
        assert_eq!(
            detector.candidates(None, "<bom xmlns=\"http://cyclonedx.org/schema/bom/1.5\"/>"),
            vec![DecoderKind::CycloneDxXml]
        );
        assert!(detector
            .candidates(None, "<rdf:RDF xmlns:spdx=\"http://spdx.org/rdf/terms#\"/>")
            .is_empty());
    }

    #[test]
    fn test_decode_falls_through_to_next_candidate() {
        let detector = FormatDetector::new();
        let spdx = r#"{"spdxVersion": "SPDX-2.3", "SPDXID": "SPDXRef-DOCUMENT", "packages": [
            {"SPDXID": "SPDXRef-a", "name": "a", "versionInfo": "1"}]}"#;
        let (kind, decoded) = detector
            .decode(Some(Path::new("odd.cdx.json")), spdx, "odd.cdx.json")
            .expect("decode");
        assert_eq!(kind, DecoderKind::SpdxJson);
        assert_eq!(decoded.records.len(), 1);
    }

    #[test]
    fn test_decode_exhausted_is_unknown_format() {
        let detector = FormatDetector::new();
        let err = detector
            .decode(None, "just some text", "notes.txt")
            .unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat(_)));
    }
}
