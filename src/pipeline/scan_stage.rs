//! Vulnerability scan of a joined inventory.

use super::PipelineError;
use crate::config::ScanConfig;
use crate::model::Sbom;
use crate::scan::{NoOpScanner, ScanResults, Scanner};

/// Scanner for the configuration: OSV when enabled, otherwise the no-op scanner.
pub fn build_scanner(config: &ScanConfig) -> Result<Box<dyn Scanner>, PipelineError> {
    if !config.enabled {
        tracing::info!("Vulnerability scanning disabled");
        return Ok(Box::new(NoOpScanner::new()));
    }

    #[cfg(feature = "enrichment")]
    {
        let scanner = crate::scan::OsvScanner::new(config)
            .map_err(|source| PipelineError::ScanFailed { source })?;
        Ok(Box::new(scanner))
    }

    #[cfg(not(feature = "enrichment"))]
    {
        tracing::warn!("Scanning requested but the 'enrichment' feature is not enabled");
        Ok(Box::new(NoOpScanner::new()))
    }
}

/// Scan every package of `sbom`.
pub fn scan_inventory(sbom: &Sbom, scanner: &dyn Scanner) -> Result<ScanResults, PipelineError> {
    let packages = sbom.package_infos();
    tracing::info!("Scanning {} packages with {}", packages.len(), scanner.name());

    let results = scanner
        .scan(&packages)
        .map_err(|source| PipelineError::ScanFailed { source })?;

    tracing::info!(
        "Found {} vulnerabilities in {} packages",
        results.vulnerability_count(),
        results.vulnerable_packages().count()
    );
    Ok(results)
}
