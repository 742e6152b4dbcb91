//! Detection of VEX document formats from JSON content.

use serde::{Deserialize, Serialize};
use std::fmt;

const OPENVEX_CONTEXT: &str = "https://openvex.dev/ns";

/// A VEX format this crate decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VexFormat {
    /// OpenVEX, any version, including the Ubuntu `metadata` envelope
    OpenVex,
    /// CycloneDX BOM carrying `vulnerabilities` with `analysis`
    CycloneDx,
    /// CSAF with document category `csaf_vex`
    Csaf,
}

impl VexFormat {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OpenVex => "OpenVEX",
            Self::CycloneDx => "CycloneDX VEX",
            Self::Csaf => "CSAF VEX",
        }
    }
}

impl fmt::Display for VexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Just the fields that tell the formats apart
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "@context")]
    context: Option<String>,
    metadata: Option<Metadata>,
    document: Option<CsafMeta>,
    #[serde(rename = "bomFormat")]
    bom_format: Option<String>,
    vulnerabilities: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Metadata {
    #[serde(rename = "@context")]
    context: Option<String>,
}

#[derive(Deserialize)]
struct CsafMeta {
    category: Option<String>,
}

/// Which VEX format `content` is, if any.
#[must_use]
pub fn detect_vex(content: &str) -> Option<VexFormat> {
    let envelope: Envelope = serde_json::from_str(content).ok()?;

    let is_openvex = |ctx: &Option<String>| {
        ctx.as_deref()
            .is_some_and(|c| c.trim().starts_with(OPENVEX_CONTEXT))
    };
    if is_openvex(&envelope.context)
        || envelope.metadata.as_ref().is_some_and(|m| is_openvex(&m.context))
    {
        return Some(VexFormat::OpenVex);
    }

    if envelope
        .document
        .and_then(|d| d.category)
        .is_some_and(|c| c == "csaf_vex")
    {
        return Some(VexFormat::Csaf);
    }

    let is_cyclonedx = envelope.bom_format.as_deref() == Some("CycloneDX");
    if is_cyclonedx && envelope.vulnerabilities.as_ref().is_some_and(|v| v.is_array()) {
        return Some(VexFormat::CycloneDx);
    }

    None
}
