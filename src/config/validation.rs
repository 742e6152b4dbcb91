//! Configuration validation for sbom-join.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{AppConfig, InputConfig, JoinConfig, OutputConfig, ScanConfig};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.join.validate());
        errors.extend(self.scan.validate());
        errors.extend(self.output.validate());
        errors.extend(self.input.validate());
        errors
    }
}

impl Validatable for JoinConfig {
    fn validate(&self) -> Vec<ConfigError> {
        self.extra_unknown_versions
            .iter()
            .filter(|v| v.trim().is_empty())
            .map(|_| {
                ConfigError::new(
                    "join.extra_unknown_versions",
                    "Empty entries are already treated as unknown",
                )
            })
            .take(1)
            .collect()
    }
}

impl Validatable for ScanConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            errors.push(ConfigError::new(
                "scan.api_url",
                format!("Expected an http(s) URL, got '{}'", self.api_url),
            ));
        }
        if self.max_concurrent == 0 {
            errors.push(ConfigError::new(
                "scan.max_concurrent",
                "Max concurrent requests must be at least 1",
            ));
        }
        if self.timeout_secs == 0 {
            errors.push(ConfigError::new(
                "scan.timeout_secs",
                "Timeout must be at least 1 second",
            ));
        }
        if self.base_backoff_ms == 0 {
            errors.push(ConfigError::new(
                "scan.base_backoff_ms",
                "Backoff must be at least 1 ms",
            ));
        }
        if self.max_backoff_secs.saturating_mul(1000) < self.base_backoff_ms {
            errors.push(ConfigError::new(
                "scan.max_backoff_secs",
                format!(
                    "Max backoff ({}s) is below the base backoff ({}ms)",
                    self.max_backoff_secs, self.base_backoff_ms
                ),
            ));
        }

        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Some(ref file_path) = self.file {
            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(ConfigError::new(
                        "output.file",
                        format!("Parent directory does not exist: {}", parent.display()),
                    ));
                }
            }
        }

        errors
    }
}

impl Validatable for InputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        if self.max_file_size_mb == 0 {
            vec![ConfigError::new(
                "input.max_file_size_mb",
                "Maximum file size must be at least 1 MB",
            )]
        } else {
            Vec::new()
        }
    }
}
