//! Configuration module for sbom-join.
//!
//! This module provides a unified configuration system with:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Quick Start
//!
//! ```rust
//! use sbom_join::config::{AppConfig, OutputFormat, Validatable};
//!
//! let config = AppConfig::builder()
//!     .extra_unknown_versions(["dev"])
//!     .output_format(OutputFormat::Summary)
//!     .build();
//! assert!(config.is_valid());
//! ```
//!
//! # Configuration File
//!
//! Place a `.sbom-join.yaml` file in your project root or `~/.config/sbom-join/`:
//!
//! ```yaml
//! join:
//!   extra_unknown_versions: [dev, snapshot]
//! scan:
//!   enabled: true
//!   max_concurrent: 4
//! ```

pub mod file;
mod types;
mod validation;

pub use types::{
    AppConfig, AppConfigBuilder, InputConfig, JoinConfig, OutputConfig, OutputFormat, ScanConfig,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    CliOverrides, ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// This schema documents all configuration options that can be set in
/// `.sbom-join.yaml` config files. It can be used by editors for
/// validation and autocompletion.
pub fn generate_json_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_schema_lists_sections() {
        let schema = generate_json_schema().expect("schema");
        for section in ["join", "scan", "output", "input"] {
            assert!(schema.contains(&format!("\"{section}\"")), "{section}");
        }
    }
}
