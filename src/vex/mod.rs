//! VEX (Vulnerability Exploitability eXchange) documents.
//!
//! Decodes OpenVEX (v0.0.1, v0.2.0 and the Ubuntu `metadata` envelope),
//! CycloneDX VEX and CSAF VEX into one [`VexStatement`] model. Statements are
//! matched to inventory packages by purl and applied to scan results with
//! [`crate::scan::ScanResults::apply_vex`].

mod csaf;
mod cyclonedx;
mod detection;
mod openvex;

pub use detection::{detect_vex, VexFormat};

use crate::model::Purl;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors from reading or decoding a VEX document
#[derive(Error, Debug)]
pub enum VexError {
    #[error("Failed to read VEX file: {0}")]
    IoError(String),

    #[error("VEX JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Not a recognized VEX document: {0}")]
    UnknownFormat(String),

    #[error("Invalid VEX document: {0}")]
    InvalidDocument(String),
}

impl From<std::io::Error> for VexError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

/// Exploitability of a vulnerability for a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VexStatus {
    NotAffected,
    Affected,
    Fixed,
    UnderInvestigation,
    Unknown,
}

impl VexStatus {
    /// Parse an OpenVEX status string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "not_affected" => Some(Self::NotAffected),
            "affected" => Some(Self::Affected),
            "fixed" => Some(Self::Fixed),
            "under_investigation" => Some(Self::UnderInvestigation),
            _ => None,
        }
    }

    /// Whether the statement says the vulnerability can be set aside
    #[must_use]
    pub const fn suppresses(self) -> bool {
        matches!(self, Self::NotAffected | Self::Fixed)
    }
}

impl fmt::Display for VexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotAffected => "not_affected",
            Self::Affected => "affected",
            Self::Fixed => "fixed",
            Self::UnderInvestigation => "under_investigation",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Why a product is not affected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VexJustification {
    ComponentNotPresent,
    VulnerableCodeNotPresent,
    VulnerableCodeNotInExecutePath,
    VulnerableCodeCannotBeControlledByAdversary,
    InlineMitigationsAlreadyExist,
}

impl VexJustification {
    /// Parse an OpenVEX justification (also the CSAF flag labels)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "component_not_present" => Some(Self::ComponentNotPresent),
            "vulnerable_code_not_present" => Some(Self::VulnerableCodeNotPresent),
            "vulnerable_code_not_in_execute_path" => Some(Self::VulnerableCodeNotInExecutePath),
            "vulnerable_code_cannot_be_controlled_by_adversary" => {
                Some(Self::VulnerableCodeCannotBeControlledByAdversary)
            }
            "inline_mitigations_already_exist" => Some(Self::InlineMitigationsAlreadyExist),
            _ => None,
        }
    }
}

/// A product a statement is about.
///
/// `id` is the identifier as written in the document; `purl` is set when the
/// product is, or carries, a valid package URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VexProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<Purl>,
    /// Components inside the product the statement is narrowed to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcomponents: Vec<VexProduct>,
}

impl VexProduct {
    /// A product identified by `id`, with a purl if `id` is one
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        let purl = if id.trim_start().starts_with("pkg:") {
            Purl::parse(id).ok()
        } else {
            None
        };
        Self {
            id: Some(id.to_string()),
            purl,
            subcomponents: Vec::new(),
        }
    }

    /// Whether this product or one of its subcomponents is `purl`.
    ///
    /// A versionless product purl matches every version of the package.
    #[must_use]
    pub fn matches(&self, purl: &Purl) -> bool {
        let direct = self.purl.as_ref().is_some_and(|own| {
            own == purl || (own.version().is_none() && own.same_package(purl))
        });
        direct || self.subcomponents.iter().any(|sub| sub.matches(purl))
    }
}

/// One VEX statement, normalized across formats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VexStatement {
    /// Vulnerability ID (CVE, GHSA, ...)
    pub vulnerability: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub status: VexStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<VexJustification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_statement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub products: Vec<VexProduct>,
    /// Project the document was published for, when the caller knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Purl>,
    pub format: VexFormat,
    pub source_path: String,
}

impl VexStatement {
    /// Whether the statement is about vulnerability `id` (or one of `aliases`)
    #[must_use]
    pub fn names(&self, id: &str, aliases: &[String]) -> bool {
        std::iter::once(&self.vulnerability)
            .chain(&self.aliases)
            .any(|v| v.eq_ignore_ascii_case(id) || aliases.iter().any(|a| a.eq_ignore_ascii_case(v)))
    }

    /// Whether the statement covers the package `purl`
    #[must_use]
    pub fn applies_to(&self, purl: &Purl) -> bool {
        self.products.iter().any(|p| p.matches(purl))
    }
}

/// A decoded VEX document
#[derive(Debug, Clone)]
pub struct VexDocument {
    pub format: VexFormat,
    pub source_path: String,
    pub statements: Vec<VexStatement>,
}

/// Decode VEX `content`, detecting its format.
///
/// `owner` is stamped on every statement.
pub fn decode_vex_str(
    content: &str,
    source_path: &str,
    owner: Option<&Purl>,
) -> Result<VexDocument, VexError> {
    let format = detect_vex(content)
        .ok_or_else(|| VexError::UnknownFormat(source_path.to_string()))?;

    let mut statements = match format {
        VexFormat::OpenVex => openvex::decode(content)?,
        VexFormat::CycloneDx => cyclonedx::decode(content)?,
        VexFormat::Csaf => csaf::decode(content)?,
    };
    for statement in &mut statements {
        statement.format = format;
        statement.source_path = source_path.to_string();
        statement.owner = owner.cloned();
    }

    tracing::info!(
        "Loaded {} VEX statements from {} ({})",
        statements.len(),
        source_path,
        format
    );
    Ok(VexDocument {
        format,
        source_path: source_path.to_string(),
        statements,
    })
}

/// Read and decode a VEX file of at most `max_size` bytes.
pub fn decode_vex_file(
    path: &Path,
    max_size: u64,
    owner: Option<&Purl>,
) -> Result<VexDocument, VexError> {
    let size = std::fs::metadata(path)?.len();
    if size > max_size {
        return Err(VexError::IoError(format!(
            "{} is {size} bytes, exceeding the {} MB limit",
            path.display(),
            max_size / (1024 * 1024)
        )));
    }
    let content = std::fs::read_to_string(path)?;
    decode_vex_str(&content, &path.display().to_string(), owner)
}

/// Statement scaffold the format decoders fill in
fn statement(vulnerability: String, status: VexStatus) -> VexStatement {
    VexStatement {
        vulnerability,
        aliases: Vec::new(),
        status,
        justification: None,
        impact_statement: None,
        action_statement: None,
        status_notes: None,
        timestamp: None,
        products: Vec::new(),
        owner: None,
        format: VexFormat::OpenVex,
        source_path: String::new(),
    }
}

/// `None` for missing or blank strings
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
