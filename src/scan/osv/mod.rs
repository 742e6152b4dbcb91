//! OSV (Open Source Vulnerabilities) scanner.
//!
//! Queries <https://osv.dev> once per distinct (ecosystem, name, version),
//! with a bounded number of requests in flight.

mod client;
mod response;

pub use client::OsvClient;

use super::{PackageScanResult, QueryKey, RequestCache, ScanResults, Scanner, Vulnerability};
use crate::config::ScanConfig;
use crate::error::{Result, SbomError, ScanErrorKind};
use crate::model::{is_version_unknown, PackageInfo};
use rayon::prelude::*;

/// Shared outcome of one de-duplicated query
type QueryOutcome = std::result::Result<Vec<Vulnerability>, String>;

/// Scanner backed by the OSV query API.
pub struct OsvScanner {
    client: OsvClient,
    cache: RequestCache<QueryKey, QueryOutcome>,
    pool: rayon::ThreadPool,
}

impl OsvScanner {
    /// Create a scanner with at most `config.max_concurrent` requests in flight.
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_concurrent.max(1))
            .thread_name(|i| format!("osv-scan-{i}"))
            .build()
            .map_err(|e| {
                SbomError::scan(
                    "Failed to start scan workers",
                    ScanErrorKind::Unavailable(e.to_string()),
                )
            })?;

        Ok(Self {
            client: OsvClient::new(config)?,
            cache: RequestCache::new(),
            pool,
        })
    }

    /// Query key for a package, or `None` when OSV cannot answer for it.
    fn query_key(package: &PackageInfo) -> Option<QueryKey> {
        let version = package.version.as_deref();
        if is_version_unknown(version) {
            return None;
        }
        QueryKey::for_purl(&package.purl, version?)
    }

    fn scan_one(&self, package: &PackageInfo) -> (PackageScanResult, Option<String>) {
        let mut result = PackageScanResult::clean(package);
        let Some(key) = Self::query_key(package) else {
            tracing::debug!("Skipping {}: no OSV ecosystem or version", package.key());
            return (result, None);
        };

        let outcome = self.cache.get_or_fetch(key.clone(), || {
            self.client.query(&key).map_err(|e| e.to_string())
        });
        match outcome {
            Ok(vulnerabilities) => {
                result.vulnerabilities = vulnerabilities;
                (result, None)
            }
            Err(message) => {
                tracing::warn!("OSV query failed for {}: {}", package.key(), message);
                (result, Some(format!("{}: {}", package.key(), message)))
            }
        }
    }
}

impl Scanner for OsvScanner {
    fn name(&self) -> &'static str {
        "OSV"
    }

    fn scan(&self, packages: &[PackageInfo]) -> Result<ScanResults> {
        let queried = packages
            .iter()
            .filter(|p| Self::query_key(p).is_some())
            .count();

        let outcomes: Vec<(PackageScanResult, Option<String>)> = self
            .pool
            .install(|| packages.par_iter().map(|p| self.scan_one(p)).collect());

        let mut results = ScanResults::empty();
        for (result, error) in outcomes {
            results.packages.push(result);
            results.errors.extend(error);
        }

        tracing::info!(
            "OSV scan: {} packages, {} queried, {} distinct queries, {} failed",
            packages.len(),
            queried,
            self.cache.len(),
            results.errors.len()
        );

        if queried > 0 && results.errors.len() == queried {
            return Err(SbomError::scan(
                "every OSV query failed",
                ScanErrorKind::Aggregate {
                    source_name: self.name().to_string(),
                    total: queried,
                    errors: results.errors,
                },
            ));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawPackage;

    fn package(purl: &str, version: Option<&str>) -> PackageInfo {
        let mut raw = RawPackage::new("p", purl);
        if let Some(v) = version {
            raw = raw.with_version(v);
        }
        PackageInfo::from_raw(&raw).expect("valid")
    }

    #[test]
    fn test_query_key_skips_unscannable() {
        assert!(OsvScanner::query_key(&package("pkg:npm/p@1.0", Some("1.0"))).is_some());
        assert!(OsvScanner::query_key(&package("pkg:npm/p", None)).is_none());
        assert!(OsvScanner::query_key(&package("pkg:npm/p@unknown", Some("unknown"))).is_none());
        assert!(OsvScanner::query_key(&package("pkg:internal/p@1.0", Some("1.0"))).is_none());
    }

    #[test]
    fn test_scan_without_queries_is_clean() {
        let scanner = OsvScanner::new(&ScanConfig::default()).unwrap();
        let packages = [package("pkg:internal/p@1.0", Some("1.0"))];
        let results = scanner.scan(&packages).unwrap();
        assert_eq!(results.packages.len(), 1);
        assert!(results.errors.is_empty());
        assert!(scanner.cache.is_empty());
    }

    #[test]
    fn test_all_failures_aggregate() {
        let config = ScanConfig {
            api_url: "http://127.0.0.1:9/v1/query".to_string(),
            max_retries: 0,
            timeout_secs: 1,
            ..ScanConfig::default()
        };
        let scanner = OsvScanner::new(&config).unwrap();
        let packages = [
            package("pkg:npm/a@1.0", Some("1.0")),
            package("pkg:npm/b@2.0", Some("2.0")),
        ];
        let err = scanner.scan(&packages).unwrap_err();
        match err {
            SbomError::Scan {
                source: ScanErrorKind::Aggregate { total, errors, .. },
                ..
            } => {
                assert_eq!(total, 2);
                assert_eq!(errors.len(), 2);
            }
            other => panic!("expected aggregate scan error, got {other:?}"),
        }
    }
}
