//! Configuration types for sbom-join operations.
//!
//! Provides structured configuration for joining, scanning and output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// Config files provide the base; CLI flags override individual values
/// through [`AppConfig::merge_cli`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Declaration/discovery join options
    pub join: JoinConfig,
    /// Vulnerability scan options
    pub scan: ScanConfig,
    /// Output configuration (format, file)
    pub output: OutputConfig,
    /// Input document limits
    pub input: InputConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Add version strings treated as unknown during the join.
    pub fn extra_unknown_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .join
            .extra_unknown_versions
            .extend(versions.into_iter().map(Into::into));
        self
    }

    /// Set the output format.
    pub const fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Enable or disable vulnerability scanning.
    pub const fn scan_enabled(mut self, enabled: bool) -> Self {
        self.config.scan.enabled = enabled;
        self
    }

    /// Replace the scan configuration.
    pub fn scan(mut self, scan: ScanConfig) -> Self {
        self.config.scan = scan;
        self
    }

    /// Set the maximum input document size in megabytes.
    pub const fn max_file_size_mb(mut self, mb: u64) -> Self {
        self.config.input.max_file_size_mb = mb;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Join Configuration
// ============================================================================

/// Options for joining declared and discovered inventories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct JoinConfig {
    /// Extra version strings treated like "unknown" (case-insensitive),
    /// on top of the built-in list
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_unknown_versions: Vec<String>,
}

// ============================================================================
// Scan Configuration
// ============================================================================

/// Vulnerability scan configuration.
///
/// This configuration is always defined regardless of the `enrichment` feature flag.
/// When the feature is disabled, scanning is unavailable at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScanConfig {
    /// Enable scanning (if false, the `inventory` command never scans)
    pub enabled: bool,
    /// OSV query endpoint
    pub api_url: String,
    /// API timeout in seconds
    #[schemars(range(min = 1))]
    pub timeout_secs: u64,
    /// Maximum concurrent requests
    #[schemars(range(min = 1))]
    pub max_concurrent: usize,
    /// Retries per request for retryable failures
    pub max_retries: u32,
    /// First backoff delay in milliseconds; doubles per attempt
    #[schemars(range(min = 1))]
    pub base_backoff_ms: u64,
    /// Upper bound for a single backoff delay in seconds
    #[schemars(range(min = 1))]
    pub max_backoff_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.osv.dev/v1/query".to_string(),
            timeout_secs: 30,
            max_concurrent: 8,
            max_retries: 5,
            base_backoff_ms: 1000,
            max_backoff_secs: 30,
        }
    }
}

impl ScanConfig {
    /// Create an enabled scan config against the public OSV API.
    #[must_use]
    pub fn osv() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`, capped.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let max = Duration::from_secs(self.max_backoff_secs);
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(self.base_backoff_ms.saturating_mul(factor));
        delay.min(max)
    }
}

// ============================================================================
// Output Configuration
// ============================================================================

/// Output format for inventories and scan results
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Full JSON document
    #[default]
    Json,
    /// Human-readable summary
    Summary,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Summary => write!(f, "summary"),
        }
    }
}

/// Output-related configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: OutputFormat,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

// ============================================================================
// Input Configuration
// ============================================================================

/// Limits applied when reading documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct InputConfig {
    /// Largest document accepted, in megabytes
    #[schemars(range(min = 1))]
    pub max_file_size_mb: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: crate::parsers::MAX_SBOM_FILE_SIZE / (1024 * 1024),
        }
    }
}

impl InputConfig {
    /// Limit in bytes
    #[must_use]
    pub const fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}
