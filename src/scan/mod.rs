//! Vulnerability scanning of joined inventories.
//!
//! A [`Scanner`] takes the packages of an inventory and reports known
//! vulnerabilities per package. [`NoOpScanner`] stands in when scanning is
//! disabled; [`OsvScanner`] (feature `enrichment`) queries the OSV API.
//!
//! Per-package failures are collected in [`ScanResults::errors`]; a scan
//! fails as a whole only when every queried package failed.

mod cache;
mod ecosystem;
#[cfg(feature = "enrichment")]
mod osv;
mod retry;

pub use cache::RequestCache;
pub use ecosystem::{osv_ecosystem, osv_package_name, QueryKey};
#[cfg(feature = "enrichment")]
pub use osv::{OsvClient, OsvScanner};
pub use retry::{is_retryable_status, with_retry, AttemptError};

use crate::error::Result;
use crate::model::{PackageInfo, Purl};
use crate::vex::{VexJustification, VexStatement, VexStatus};
use serde::{Deserialize, Serialize};

/// A severity score as reported by the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityScore {
    /// Scoring system (e.g. `CVSS_V3`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Score or vector string
    pub score: String,
}

/// A known vulnerability affecting a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Vulnerability ID (e.g. `GHSA-xxxx`, `CVE-xxxx`)
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub severity: Vec<SeverityScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Verdict of the VEX statement covering this finding, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vex: Option<VexAssessment>,
}

impl Vulnerability {
    /// Whether a VEX statement declared this finding not applicable
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.vex.as_ref().is_some_and(|v| v.status.suppresses())
    }
}

/// What a VEX statement says about one finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VexAssessment {
    pub status: VexStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<VexJustification>,
    /// VEX document the statement came from
    pub source: String,
}

/// Scan outcome for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageScanResult {
    pub purl: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub vulnerabilities: Vec<Vulnerability>,
}

impl PackageScanResult {
    /// A result with no findings for `package`
    #[must_use]
    pub fn clean(package: &PackageInfo) -> Self {
        Self {
            purl: package.key().to_string(),
            name: package.name.clone(),
            version: package.version.clone(),
            vulnerabilities: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_vulnerable(&self) -> bool {
        !self.vulnerabilities.is_empty()
    }
}

/// Results of scanning a package list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResults {
    /// One entry per scanned package, in input order
    pub packages: Vec<PackageScanResult>,
    /// Per-package failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ScanResults {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Total findings across all packages
    #[must_use]
    pub fn vulnerability_count(&self) -> usize {
        self.packages.iter().map(|p| p.vulnerabilities.len()).sum()
    }

    /// Packages with at least one finding
    pub fn vulnerable_packages(&self) -> impl Iterator<Item = &PackageScanResult> {
        self.packages.iter().filter(|p| p.is_vulnerable())
    }

    /// Findings a VEX statement set aside as not affected or fixed
    #[must_use]
    pub fn suppressed_count(&self) -> usize {
        self.packages
            .iter()
            .flat_map(|p| &p.vulnerabilities)
            .filter(|v| v.is_suppressed())
            .count()
    }

    /// Attach VEX verdicts to the findings they cover.
    ///
    /// A statement covers a finding when it names the vulnerability (or an
    /// alias) and one of its products is the package. When several do, the
    /// last one wins. Returns the number of findings annotated.
    pub fn apply_vex(&mut self, statements: &[VexStatement]) -> usize {
        if statements.is_empty() {
            return 0;
        }
        let mut annotated = 0;
        for package in &mut self.packages {
            let Ok(purl) = Purl::parse(&package.purl) else {
                continue;
            };
            for vuln in &mut package.vulnerabilities {
                let verdict = statements
                    .iter()
                    .rev()
                    .find(|s| s.names(&vuln.id, &vuln.aliases) && s.applies_to(&purl));
                if let Some(statement) = verdict {
                    tracing::debug!(
                        "{} in {}: {} per {}",
                        vuln.id,
                        purl,
                        statement.status,
                        statement.source_path
                    );
                    vuln.vex = Some(VexAssessment {
                        status: statement.status,
                        justification: statement.justification,
                        source: statement.source_path.clone(),
                    });
                    annotated += 1;
                }
            }
        }
        annotated
    }
}

/// Trait for vulnerability scanners.
///
/// Implement this trait to add new vulnerability data sources.
///
/// # Example
///
/// ```ignore
/// use sbom_join::scan::{NoOpScanner, OsvScanner, Scanner};
///
/// // Use NoOpScanner when scanning is disabled
/// let scanner: Box<dyn Scanner> = if config.scan.enabled {
///     Box::new(OsvScanner::new(&config.scan)?)
/// } else {
///     Box::new(NoOpScanner)
/// };
///
/// let results = scanner.scan(&packages)?;
/// ```
pub trait Scanner: Send + Sync {
    /// Get the name of this scanner (e.g., "OSV").
    fn name(&self) -> &'static str;

    /// Scan packages for known vulnerabilities.
    fn scan(&self, packages: &[PackageInfo]) -> Result<ScanResults>;
}

/// A scanner that finds nothing.
///
/// Use this when scanning is disabled or unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpScanner;

impl NoOpScanner {
    /// Create a new no-op scanner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Scanner for NoOpScanner {
    fn name(&self) -> &'static str {
        "NoOp"
    }

    fn scan(&self, _packages: &[PackageInfo]) -> Result<ScanResults> {
        Ok(ScanResults::empty())
    }
}
