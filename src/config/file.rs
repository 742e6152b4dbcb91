//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::{AppConfig, OutputFormat};
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
const CONFIG_FILE_NAMES: &[&str] = &[
    ".sbom-join.yaml",
    ".sbom-join.yml",
    "sbom-join.yaml",
    "sbom-join.yml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. User config directory (~/.config/sbom-join/)
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if let Some(path) = find_config_in_dir(&cwd) {
            return Some(path);
        }
    }

    dirs::config_dir().and_then(|dir| find_config_in_dir(&dir.join("sbom-join")))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug)]
pub enum ConfigFileError {
    /// File not found
    NotFound(PathBuf),
    /// IO error reading file
    Io(std::io::Error),
    /// YAML parsing error
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => {
                write!(f, "Config file not found: {}", path.display())
            }
            Self::Io(e) => write!(f, "Failed to read config file: {e}"),
            Self::Parse(e) => write!(f, "Failed to parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigFileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigFileError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err)
    }
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

/// Values given on the command line; `None` and empty mean "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_format: Option<OutputFormat>,
    pub output_file: Option<PathBuf>,
    pub extra_unknown_versions: Vec<String>,
    pub scan_enabled: Option<bool>,
    pub max_concurrent: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub max_file_size_mb: Option<u64>,
}

impl AppConfig {
    /// Layer CLI values over this config; anything given on the CLI wins.
    pub fn merge_cli(&mut self, cli: &CliOverrides) {
        if let Some(format) = cli.output_format {
            self.output.format = format;
        }
        if cli.output_file.is_some() {
            self.output.file.clone_from(&cli.output_file);
        }
        for version in &cli.extra_unknown_versions {
            if !self.join.extra_unknown_versions.contains(version) {
                self.join.extra_unknown_versions.push(version.clone());
            }
        }
        if let Some(enabled) = cli.scan_enabled {
            self.scan.enabled = enabled;
        }
        if let Some(max_concurrent) = cli.max_concurrent {
            self.scan.max_concurrent = max_concurrent;
        }
        if let Some(timeout) = cli.timeout_secs {
            self.scan.timeout_secs = timeout;
        }
        if let Some(mb) = cli.max_file_size_mb {
            self.input.max_file_size_mb = mb;
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli: &CliOverrides,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge_cli(cli);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# sbom-join configuration
# Place this file at .sbom-join.yaml in your project root or ~/.config/sbom-join/

{}
",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".sbom-join.yaml");
        std::fs::write(&config_path, "scan:\n  enabled: true\n").unwrap();

        assert_eq!(find_config_in_dir(tmp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");

        let yaml = r"
join:
  extra_unknown_versions: [dev, SNAPSHOT]
scan:
  enabled: true
  max_concurrent: 4
output:
  format: summary
";
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.join.extra_unknown_versions, ["dev", "SNAPSHOT"]);
        assert!(config.scan.enabled);
        assert_eq!(config.scan.max_concurrent, 4);
        assert_eq!(config.output.format, OutputFormat::Summary);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_load_config_file_invalid_yaml() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("bad.yaml");
        std::fs::write(&config_path, "scan: [unterminated").unwrap();
        assert!(matches!(
            load_config_file(&config_path),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn test_merge_cli() {
        let mut config = AppConfig::builder()
            .extra_unknown_versions(["dev"])
            .max_file_size_mb(64)
            .build();
        let cli = CliOverrides {
            output_format: Some(OutputFormat::Summary),
            extra_unknown_versions: vec!["dev".to_string(), "snapshot".to_string()],
            scan_enabled: Some(true),
            ..Default::default()
        };

        config.merge_cli(&cli);

        assert_eq!(config.output.format, OutputFormat::Summary);
        assert_eq!(config.join.extra_unknown_versions, ["dev", "snapshot"]);
        assert!(config.scan.enabled);
        assert_eq!(config.input.max_file_size_mb, 64);
    }

    #[test]
    fn test_generate_example_config() {
        let example = generate_example_config();
        assert!(example.contains("scan:"));
        assert!(example.contains("api_url"));
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        std::fs::write(&config_path, "input:\n  max_file_size_mb: 10\n").unwrap();

        assert_eq!(discover_config_file(Some(&config_path)), Some(config_path));
    }
}
